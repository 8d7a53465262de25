use serde::Serialize;
use tracker_models::{ExternalMetadata, ItemDraft, MediaKind, SeriesInfo};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub external_id: u64,
    pub title: String,
    pub media_kind: MediaKind,
    pub year: Option<u32>,
    pub overview: Option<String>,
    pub rating: Option<f32>,
}

/// Everything known about one title, ready to become a collection item.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleDetails {
    pub external_id: u64,
    pub title: String,
    pub media_kind: MediaKind,
    pub year: Option<u32>,
    pub metadata: ExternalMetadata,
    /// Season layout; only for series.
    pub series: Option<SeriesInfo>,
}

impl TitleDetails {
    pub fn into_draft(self) -> ItemDraft {
        ItemDraft {
            title: self.title,
            media_kind: self.media_kind,
            year: self.year,
            genres: self.metadata.genres.clone(),
            external_id: Some(self.external_id),
            metadata: Some(self.metadata),
            series: self.series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracker_models::SeasonInfo;

    #[test]
    fn test_into_draft_carries_series_layout() {
        let details = TitleDetails {
            external_id: 70523,
            title: "Dark".to_string(),
            media_kind: MediaKind::Series,
            year: Some(2017),
            metadata: ExternalMetadata {
                genres: vec!["Drama".to_string(), "Mystery".to_string()],
                ..ExternalMetadata::default()
            },
            series: Some(SeriesInfo::from_seasons(vec![SeasonInfo::with_count(1, 10)])),
        };

        let draft = details.into_draft();
        assert_eq!(draft.external_id, Some(70523));
        assert_eq!(draft.genres, vec!["Drama", "Mystery"]);
        assert_eq!(draft.series.unwrap().seasons.len(), 1);
        assert!(draft.metadata.is_some());
    }
}
