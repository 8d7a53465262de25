use color_eyre::eyre::{eyre, Result};
use tracker_config::{Config, PathManager};
use tracker_core::{ChangeEvent, CollectionStore, FileStore, StoreOptions, TrackerError};
use tracker_models::{Item, ItemId};
use tracing::debug;

/// Everything a command needs: resolved paths, validated config and the
/// opened collection.
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub store: CollectionStore,
}

impl AppContext {
    pub fn load_config(paths: &PathManager) -> Result<Config> {
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file).map_err(|e| {
            eyre!("Failed to load config from {}: {}", config_file.display(), e)
        })?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;
        Ok(config)
    }

    pub fn open(paths: PathManager, config: Config) -> Result<Self> {
        let paths = match &config.storage.data_dir {
            Some(dir) => paths.with_data_dir(dir.clone()),
            None => paths,
        };
        paths
            .ensure_directories()
            .map_err(|e| eyre!("Failed to create data directories: {}", e))?;

        let mut store = CollectionStore::open(
            FileStore::from_paths(&paths),
            StoreOptions::from_config(&config),
        );
        store.subscribe(|event: &ChangeEvent| {
            debug!(
                "Collection change: {} ({} item(s))",
                event.kind,
                event.items.len()
            );
        });

        Ok(Self {
            paths,
            config,
            store,
        })
    }

    /// Find an item by id, exact title or a unique title fragment
    /// (all case-insensitive).
    pub fn resolve(&self, selector: &str) -> Result<ItemId> {
        resolve_item(self.store.items(), selector)
    }
}

pub fn resolve_item(items: &[Item], selector: &str) -> Result<ItemId> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(eyre!("No item given"));
    }

    if let Ok(id) = selector.parse::<ItemId>() {
        if items.iter().any(|item| item.id == id) {
            return Ok(id);
        }
    }

    let needle = selector.to_lowercase();
    if let Some(item) = items.iter().find(|item| item.title.to_lowercase() == needle) {
        return Ok(item.id);
    }

    let matches: Vec<&Item> = items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .collect();
    match matches.as_slice() {
        [item] => Ok(item.id),
        [] => Err(TrackerError::not_found(format!("no item matches '{}'", selector)).into()),
        many => {
            let candidates: Vec<String> = many
                .iter()
                .take(5)
                .map(|item| format!("{} (#{})", item.title, item.id))
                .collect();
            Err(eyre!(
                "'{}' matches {} items: {}. Use the id instead",
                selector,
                many.len(),
                candidates.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, title: &str) -> Item {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "title": title,
            "type": "movie",
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_by_id_and_title() {
        let items = vec![item(1, "Alien"), item(2, "Aliens"), item(3, "Heat")];

        assert_eq!(resolve_item(&items, "3").unwrap(), ItemId(3));
        assert_eq!(resolve_item(&items, "alien").unwrap(), ItemId(1));
        assert_eq!(resolve_item(&items, "hea").unwrap(), ItemId(3));
    }

    #[test]
    fn test_resolve_rejects_ambiguous_and_missing() {
        let items = vec![item(1, "Alien"), item(2, "Aliens"), item(3, "Heat")];

        assert!(resolve_item(&items, "lie").is_err());
        assert!(resolve_item(&items, "Ronin").is_err());
        assert!(resolve_item(&items, "  ").is_err());
    }
}
