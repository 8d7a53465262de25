pub mod backup;
pub mod episodes;
pub mod error;
pub mod events;
pub mod filter;
pub mod migration;
pub mod storage;
pub mod store;
pub mod tracker;

pub use backup::{
    default_export_file_name, read_snapshot_file, write_snapshot_file, ImportSummary, MAX_IMPORT_BYTES,
};
pub use episodes::{build_episodes, distribute_episodes, EpisodeProgress};
pub use error::{StorageError, TrackerError, TrackerResult};
pub use events::{ChangeEvent, ChangeKind, ChangeNotifier, SubscriptionToken};
pub use filter::{available_genres, ItemQuery, MediaFilter, SortOrder, WatchFilter};
pub use migration::{migrate, MigrationReport};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{year_from_title, CollectionStore, IdSequence, NoOpReason, StoreOptions, WatchToggle};
pub use tracker::{CascadePreview, EpisodeToggle, EpisodeTracker};

/// Version stamped into exported snapshots.
pub const SNAPSHOT_VERSION: &str = env!("CARGO_PKG_VERSION");
