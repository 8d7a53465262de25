use crate::media::MediaKind;
use crate::metadata::ExternalMetadata;
use crate::series::SeriesInfo;

/// Input for adding an item. Identity, timestamps and watch state are assigned
/// by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub title: String,
    pub media_kind: MediaKind,
    pub year: Option<u32>,
    pub genres: Vec<String>,
    pub external_id: Option<u64>,
    pub metadata: Option<ExternalMetadata>,
    pub series: Option<SeriesInfo>, // Only consulted for series
}

impl ItemDraft {
    pub fn new(title: impl Into<String>, media_kind: MediaKind) -> Self {
        Self {
            title: title.into(),
            media_kind,
            year: None,
            genres: Vec::new(),
            external_id: None,
            metadata: None,
            series: None,
        }
    }

    pub fn movie(title: impl Into<String>) -> Self {
        Self::new(title, MediaKind::Movie)
    }

    pub fn series(title: impl Into<String>, info: SeriesInfo) -> Self {
        Self {
            series: Some(info),
            ..Self::new(title, MediaKind::Series)
        }
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_external_id(mut self, external_id: u64) -> Self {
        self.external_id = Some(external_id);
        self
    }
}

/// Partial update. `None` leaves a field untouched; the nested options allow
/// clearing a value (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub year: Option<Option<u32>>,
    pub genres: Option<Vec<String>>,
    pub watched: Option<bool>, // Movies only
    pub user_rating: Option<u8>,
    pub user_review: Option<String>,
    pub external_id: Option<Option<u64>>,
    pub metadata: Option<ExternalMetadata>,
}

impl ItemPatch {
    pub fn rating(rating: u8) -> Self {
        Self {
            user_rating: Some(rating),
            ..Self::default()
        }
    }

    pub fn review(rating: u8, review: impl Into<String>) -> Self {
        Self {
            user_rating: Some(rating),
            user_review: Some(review.into()),
            ..Self::default()
        }
    }

    pub fn metadata(metadata: ExternalMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
