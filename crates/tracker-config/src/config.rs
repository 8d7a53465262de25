use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_collection_key")]
    pub collection_key: String,
    #[serde(default = "default_filter_key")]
    pub filter_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
    /// Pause between enrichment batches.
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
    /// Requests in flight per enrichment batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// One of: added, title, title-desc, year, year-old, rating
    #[serde(default = "default_sort")]
    pub default_sort: String,
    #[serde(default = "default_poster_size")]
    pub poster_size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write daily-rotated logs to the log directory.
    #[serde(default)]
    pub file: bool,
}

fn default_true() -> bool {
    true
}

fn default_collection_key() -> String {
    "movies".to_string()
}

fn default_filter_key() -> String {
    "filters".to_string()
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/".to_string()
}

fn default_rate_limit_delay_ms() -> u64 {
    100
}

fn default_batch_size() -> usize {
    5
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_sort() -> String {
    "added".to_string()
}

fn default_poster_size() -> String {
    "w500".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            collection_key: default_collection_key(),
            filter_key: default_filter_key(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
            batch_size: default_batch_size(),
            language: default_language(),
            region: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_sort: default_sort(),
            poster_size: default_poster_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults when the file does not exist yet.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let keys = [&self.storage.collection_key, &self.storage.filter_key];
        if keys.iter().any(|k| k.trim().is_empty()) {
            return Err(anyhow::anyhow!("storage keys must not be empty"));
        }
        if self.storage.collection_key == self.storage.filter_key {
            return Err(anyhow::anyhow!(
                "collection_key and filter_key must differ (both are '{}')",
                self.storage.collection_key
            ));
        }

        if self.tmdb.batch_size == 0 {
            return Err(anyhow::anyhow!("tmdb.batch_size must be at least 1"));
        }
        for url in [&self.tmdb.base_url, &self.tmdb.image_base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow::anyhow!("Invalid TMDB URL: {}", url));
            }
        }

        Ok(())
    }

    /// Image URL prefix for posters, size segment included.
    pub fn poster_base(&self) -> String {
        format!(
            "{}/{}",
            self.tmdb.image_base_url.trim_end_matches('/'),
            self.display.poster_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let mut config = Config::default();
        config.tmdb.batch_size = 3;
        config.tmdb.region = Some("DE".to_string());
        config.storage.data_dir = Some(PathBuf::from("/mnt/media"));

        config.save_to_file(file.path()).unwrap();
        let loaded = Config::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[tmdb]\nenabled = false\n").unwrap();
        assert!(!config.tmdb.enabled);
        assert_eq!(config.tmdb.rate_limit_delay_ms, 100);
        assert_eq!(config.tmdb.batch_size, 5);
        assert_eq!(config.storage.collection_key, "movies");
        assert_eq!(config.storage.filter_key, "filters");
        assert_eq!(config.display.default_sort, "added");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.storage.filter_key = "movies".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.tmdb.batch_size = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.tmdb.base_url = "api.themoviedb.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poster_base() {
        let config = Config::default();
        assert_eq!(config.poster_base(), "https://image.tmdb.org/t/p/w500");
    }
}
