// Backup files: pretty-printed export documents on disk.

use crate::error::{StorageError, TrackerError, TrackerResult};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};
use tracker_models::{MediaKind, Snapshot};

/// Largest backup file accepted for import.
pub const MAX_IMPORT_BYTES: u64 = 10 * 1024 * 1024;

pub fn default_export_file_name(date: NaiveDate) -> String {
    format!("reeltrack-backup-{}.json", date.format("%Y-%m-%d"))
}

pub fn write_snapshot_file(path: &Path, snapshot: &Snapshot) -> TrackerResult<()> {
    let json = serde_json::to_string_pretty(snapshot).map_err(StorageError::from)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(StorageError::from)?;
    }

    // Atomic write: write to temp file, then rename
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &json).map_err(StorageError::from)?;
    std::fs::rename(&temp_path, path).map_err(StorageError::from)?;

    info!(
        "Exported {} items to {}",
        snapshot.movies.len(),
        path.display()
    );
    Ok(())
}

/// Read a backup file as an untyped document, ready for
/// `CollectionStore::import_value`. Only file-level checks happen here.
pub fn read_snapshot_file(path: &Path) -> TrackerResult<Value> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(TrackerError::validation(format!(
            "{} is not a .json file",
            path.display()
        )));
    }

    let size = std::fs::metadata(path)
        .map_err(|e| TrackerError::not_found(format!("{} ({})", path.display(), e)))?
        .len();
    if size == 0 {
        return Err(TrackerError::validation(format!("{} is empty", path.display())));
    }
    if size > MAX_IMPORT_BYTES {
        return Err(TrackerError::validation(format!(
            "{} is too large ({} bytes, maximum is 10 MiB)",
            path.display(),
            size
        )));
    }

    let raw = std::fs::read_to_string(path).map_err(StorageError::from)?;
    debug!("Read {} bytes from {}", raw.len(), path.display());
    serde_json::from_str(&raw)
        .map_err(|e| TrackerError::validation(format!("{} is not valid JSON: {}", path.display(), e)))
}

/// What an import would bring in, shown before the collection is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub total: usize,
    pub movies: usize,
    pub tv_shows: usize,
    pub watched: usize,
    pub version: Option<String>,
    pub export_date: Option<String>,
}

impl ImportSummary {
    /// Best-effort counts; malformed entries are simply not counted.
    pub fn from_document(document: &Value) -> Self {
        let items = document
            .get("movies")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let kind_count = |kind: MediaKind| {
            items
                .iter()
                .filter(|item| item.get("type").and_then(Value::as_str) == Some(kind.label()))
                .count()
        };

        Self {
            total: items.len(),
            movies: kind_count(MediaKind::Movie),
            tv_shows: kind_count(MediaKind::Series),
            watched: items
                .iter()
                .filter(|item| item.get("watched").and_then(Value::as_bool) == Some(true))
                .count(),
            version: document.get("version").and_then(Value::as_str).map(str::to_string),
            export_date: document
                .get("exportDate")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::store::{CollectionStore, StoreOptions};
    use serde_json::json;
    use tempfile::TempDir;
    use tracker_models::ItemDraft;

    #[test]
    fn test_default_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(default_export_file_name(date), "reeltrack-backup-2024-03-09.json");
    }

    #[test]
    fn test_file_round_trip_into_new_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backups").join("collection.json");

        let mut store = CollectionStore::open(MemoryStore::new(), StoreOptions::default());
        store.add(ItemDraft::movie("Heat")).unwrap();
        write_snapshot_file(&path, &store.export_snapshot()).unwrap();

        let document = read_snapshot_file(&path).unwrap();
        let summary = ImportSummary::from_document(&document);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.movies, 1);
        assert!(summary.version.is_some());

        let mut restored = CollectionStore::open(MemoryStore::new(), StoreOptions::default());
        restored.import_value(document).unwrap();
        assert_eq!(restored.items(), store.items());
    }

    #[test]
    fn test_file_checks() {
        let dir = TempDir::new().unwrap();

        let text = dir.path().join("backup.txt");
        std::fs::write(&text, "{}").unwrap();
        assert!(matches!(read_snapshot_file(&text), Err(TrackerError::Validation(_))));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "").unwrap();
        assert!(matches!(read_snapshot_file(&empty), Err(TrackerError::Validation(_))));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"movies\": [").unwrap();
        assert!(matches!(read_snapshot_file(&broken), Err(TrackerError::Validation(_))));

        let large = dir.path().join("large.json");
        let file = std::fs::File::create(&large).unwrap();
        file.set_len(MAX_IMPORT_BYTES + 1).unwrap();
        assert!(matches!(read_snapshot_file(&large), Err(TrackerError::Validation(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(read_snapshot_file(&missing), Err(TrackerError::NotFound(_))));
    }

    #[test]
    fn test_summary_counts() {
        let document = json!({
            "version": "1.0.0",
            "exportDate": "2024-06-01T10:00:00Z",
            "movies": [
                {"title": "Heat", "type": "movie", "watched": true},
                {"title": "Dark", "type": "tv"},
                {"title": "Ronin", "type": "movie"}
            ]
        });
        let summary = ImportSummary::from_document(&document);
        assert_eq!(
            summary,
            ImportSummary {
                total: 3,
                movies: 2,
                tv_shows: 1,
                watched: 1,
                version: Some("1.0.0".to_string()),
                export_date: Some("2024-06-01T10:00:00Z".to_string()),
            }
        );
        assert_eq!(ImportSummary::from_document(&json!({})).total, 0);
    }
}
