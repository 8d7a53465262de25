use crate::error::SourceError;
use crate::types::{SearchResult, TitleDetails};
use async_trait::async_trait;
use tracker_models::MediaKind;

/// External title metadata: search by text, then fetch details by the
/// provider's own id.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<SearchResult>, SourceError>;

    async fn details(&self, external_id: u64, kind: MediaKind) -> Result<TitleDetails, SourceError>;
}
