use crate::item::Item;
use crate::media::MediaKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full export of the collection (backup file format).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub movies: Vec<Item>,
    pub statistics: CollectionStats,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionStats {
    pub total: usize,
    #[serde(rename = "movies")]
    pub movie_count: usize,
    #[serde(rename = "tvShows")]
    pub series_count: usize,
    #[serde(rename = "watched")]
    pub watched_count: usize,
}

impl CollectionStats {
    pub fn from_items(items: &[Item]) -> Self {
        items.iter().fold(Self::default(), |mut stats, item| {
            stats.total += 1;
            match item.media_kind {
                MediaKind::Movie => stats.movie_count += 1,
                MediaKind::Series => stats.series_count += 1,
            }
            if item.watched {
                stats.watched_count += 1;
            }
            stats
        })
    }
}
