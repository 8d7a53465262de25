pub mod draft;
pub mod episode;
pub mod item;
pub mod media;
pub mod metadata;
pub mod series;
pub mod snapshot;

mod lenient;

pub use draft::{ItemDraft, ItemPatch};
pub use episode::{Episode, EpisodeKey};
pub use item::Item;
pub use media::{ItemId, MediaKind};
pub use metadata::ExternalMetadata;
pub use series::{SeasonInfo, SeriesInfo};
pub use snapshot::{CollectionStats, Snapshot};
