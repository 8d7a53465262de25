// Batched metadata refresh for items that carry an external id.

use crate::error::SourceError;
use crate::traits::MetadataProvider;
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracker_config::TmdbConfig;
use tracker_models::{ExternalMetadata, Item, ItemId, ItemPatch, MediaKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub batch_size: usize,
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            delay: Duration::from_millis(100),
        }
    }
}

impl BatchOptions {
    pub fn from_config(config: &TmdbConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            delay: Duration::from_millis(config.rate_limit_delay_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRequest {
    pub item_id: ItemId,
    pub title: String,
    pub external_id: u64,
    pub media_kind: MediaKind,
}

impl EnrichmentRequest {
    /// Items with an external id; unless `refresh`, only those without metadata.
    pub fn for_items(items: &[Item], refresh: bool) -> Vec<Self> {
        items
            .iter()
            .filter(|item| refresh || item.metadata.is_none())
            .filter_map(|item| {
                item.external_id.map(|external_id| Self {
                    item_id: item.id,
                    title: item.title.clone(),
                    external_id,
                    media_kind: item.media_kind,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct EnrichmentReport {
    pub enriched: Vec<(ItemId, ExternalMetadata)>,
    pub failed: Vec<(EnrichmentRequest, SourceError)>,
}

impl EnrichmentReport {
    /// Metadata patches for `CollectionStore::batch_update`.
    pub fn patches(&self) -> Vec<(ItemId, ItemPatch)> {
        self.enriched
            .iter()
            .map(|(id, metadata)| (*id, ItemPatch::metadata(metadata.clone())))
            .collect()
    }
}

/// Fetch details for every request, `batch_size` at a time with `delay`
/// between batches. A failed request is recorded and does not stop the run.
/// `on_batch` receives the number of requests finished so far.
pub async fn enrich<P, F>(
    provider: &P,
    requests: Vec<EnrichmentRequest>,
    options: BatchOptions,
    mut on_batch: F,
) -> EnrichmentReport
where
    P: MetadataProvider + ?Sized,
    F: FnMut(usize),
{
    let mut report = EnrichmentReport::default();
    let batch_size = options.batch_size.max(1);
    let batch_count = requests.len().div_ceil(batch_size);
    let mut done = 0;

    info!(
        "Enriching {} items from {} in {} batches",
        requests.len(),
        provider.provider_name(),
        batch_count
    );

    for (index, batch) in requests.chunks(batch_size).enumerate() {
        let results = join_all(
            batch
                .iter()
                .map(|request| provider.details(request.external_id, request.media_kind)),
        )
        .await;

        for (request, result) in batch.iter().zip(results) {
            match result {
                Ok(details) => {
                    debug!("Fetched metadata for '{}'", request.title);
                    report.enriched.push((request.item_id, details.metadata));
                }
                Err(e) => {
                    warn!("Failed to fetch metadata for '{}': {}", request.title, e);
                    report.failed.push((request.clone(), e));
                }
            }
        }

        done += batch.len();
        on_batch(done);

        if index + 1 < batch_count && !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    info!(
        "Enrichment finished: {} updated, {} failed",
        report.enriched.len(),
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SearchResult, TitleDetails};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MetadataProvider for FakeProvider {
        fn provider_name(&self) -> &str {
            "fake"
        }

        async fn search(&self, _query: &str, _kind: MediaKind) -> Result<Vec<SearchResult>, SourceError> {
            Ok(Vec::new())
        }

        async fn details(&self, external_id: u64, kind: MediaKind) -> Result<TitleDetails, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if external_id == 404 {
                return Err(SourceError::Status {
                    provider: "fake".to_string(),
                    status: 404,
                    message: "not found".to_string(),
                });
            }
            Ok(TitleDetails {
                external_id,
                title: format!("Title {}", external_id),
                media_kind: kind,
                year: None,
                metadata: ExternalMetadata {
                    overview: Some(format!("Overview {}", external_id)),
                    ..ExternalMetadata::default()
                },
                series: None,
            })
        }
    }

    fn item(id: i64, external_id: Option<u64>, with_metadata: bool) -> Item {
        Item {
            id: ItemId(id),
            title: format!("Item {}", id),
            media_kind: MediaKind::Movie,
            year: None,
            genres: Vec::new(),
            watched: false,
            user_rating: 0,
            user_review: String::new(),
            episodes: Vec::new(),
            external_id,
            metadata: with_metadata.then(ExternalMetadata::default),
            created_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_requests_skip_items_without_external_id() {
        let items = vec![item(1, Some(10), false), item(2, None, false), item(3, Some(30), true)];

        let missing = EnrichmentRequest::for_items(&items, false);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].external_id, 10);

        assert_eq!(EnrichmentRequest::for_items(&items, true).len(), 2);
    }

    #[tokio::test]
    async fn test_enrich_in_batches_and_collect_failures() {
        let provider = FakeProvider {
            calls: AtomicUsize::new(0),
        };
        let items: Vec<Item> = (1..=7)
            .map(|n| item(n, Some(if n == 4 { 404 } else { n as u64 * 10 }), false))
            .collect();
        let requests = EnrichmentRequest::for_items(&items, false);

        let mut progress = Vec::new();
        let options = BatchOptions {
            batch_size: 3,
            delay: Duration::from_millis(1),
        };
        let report = enrich(&provider, requests, options, |done| progress.push(done)).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 7);
        assert_eq!(progress, vec![3, 6, 7]);
        assert_eq!(report.enriched.len(), 6);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0.item_id, ItemId(4));
        assert!(report.failed[0].1.is_not_found());

        let patches = report.patches();
        assert_eq!(patches[0].0, ItemId(1));
        assert_eq!(
            patches[0].1.metadata.as_ref().unwrap().overview.as_deref(),
            Some("Overview 10")
        );
    }
}
