use crate::episode::{Episode, EpisodeKey};
use crate::media::{ItemId, MediaKind};
use crate::metadata::ExternalMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A movie or TV show in the collection.
///
/// Field names follow the storage/export format (`type`, `userRating`,
/// `watchedEpisodes`, `tmdb_id`) so existing backups keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: ItemId,
    pub title: String,
    #[serde(rename = "type")]
    pub media_kind: MediaKind,
    #[serde(
        default,
        deserialize_with = "crate::lenient::year",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<u32>,
    #[serde(default, deserialize_with = "crate::lenient::names")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub watched: bool,
    #[serde(default, deserialize_with = "crate::lenient::rating")]
    pub user_rating: u8, // 0 = not rated
    #[serde(default, deserialize_with = "crate::lenient::text")]
    pub user_review: String,
    #[serde(rename = "watchedEpisodes", default)]
    pub episodes: Vec<Episode>,
    #[serde(rename = "tmdb_id", default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<u64>,
    #[serde(
        rename = "tmdb_data",
        default,
        deserialize_with = "crate::lenient::metadata",
        skip_serializing_if = "Option::is_none"
    )]
    pub metadata: Option<ExternalMetadata>,
    #[serde(default = "crate::lenient::epoch", with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "crate::lenient::epoch", with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl Item {
    pub fn is_series(&self) -> bool {
        self.media_kind == MediaKind::Series
    }

    pub fn has_rating(&self) -> bool {
        self.user_rating > 0 || !self.user_review.is_empty()
    }

    pub fn episode(&self, key: EpisodeKey) -> Option<&Episode> {
        self.episodes.iter().find(|ep| ep.key() == key)
    }

    pub fn watched_episode_count(&self) -> usize {
        self.episodes.iter().filter(|ep| ep.watched).count()
    }

    /// Provider genres are used when the item has none of its own.
    pub fn all_genres(&self) -> impl Iterator<Item = &String> {
        self.genres
            .iter()
            .chain(self.metadata.iter().flat_map(|m| m.genres.iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_legacy_browser_record() {
        let raw = json!({
            "id": 1717171717171i64,
            "title": "Dark",
            "type": "tv",
            "year": "Unknown",
            "genres": [{"id": 18, "name": "Drama"}, "Mystery"],
            "watched": false,
            "userRating": null,
            "userReview": null,
            "addedDate": "6/1/2024",
            "watchedEpisodes": [
                {"season": 1, "episode": 1, "watched": true}
            ],
            "tmdb_id": 70523,
            "tmdb_data": {"overview": "A missing child...", "rating": 8.4, "genres": ["Crime"], "year": 2017},
            "lastUpdated": 1717171717171i64
        });

        let item: Item = serde_json::from_value(raw).unwrap();
        assert_eq!(item.media_kind, MediaKind::Series);
        assert_eq!(item.year, None);
        assert_eq!(item.genres, vec!["Drama", "Mystery"]);
        assert_eq!(item.user_rating, 0);
        assert_eq!(item.user_review, "");
        assert_eq!(item.episodes[0].episode_id, "");
        assert_eq!(item.external_id, Some(70523));
        assert_eq!(item.metadata.as_ref().unwrap().genres, vec!["Crime"]);
        assert_eq!(item.created_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(item.all_genres().count(), 3);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let raw = json!({"id": 1, "title": "Serial", "type": "podcast"});
        assert!(serde_json::from_value::<Item>(raw).is_err());
    }

    #[test]
    fn test_undecodable_metadata_is_dropped() {
        let raw = json!({"id": 1, "title": "Heat", "type": "movie", "tmdb_data": {"rating": "great"}});
        let item: Item = serde_json::from_value(raw).unwrap();
        assert!(item.metadata.is_none());
    }
}
