pub mod enrich;
pub mod error;
pub mod tmdb;
pub mod traits;
pub mod types;

pub use enrich::{enrich, BatchOptions, EnrichmentReport, EnrichmentRequest};
pub use error::SourceError;
pub use tmdb::TmdbClient;
pub use traits::MetadataProvider;
pub use types::{SearchResult, TitleDetails};
