use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display metadata fetched from the external provider. Never authoritative:
/// the collection keeps working when this is missing or stale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>, // Full image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>, // Provider vote average, 0-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>, // Minutes
    #[serde(default, deserialize_with = "crate::lenient::names")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "crate::lenient::names")]
    pub cast: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_seasons: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<u32>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub fetched_at: Option<DateTime<Utc>>,
}
