use serde::{Deserialize, Serialize};

/// Season/episode layout of a show as reported by the metadata provider.
/// Feeds the episode-list initializer when a series is added.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeriesInfo {
    #[serde(default)]
    pub season_count: Option<u32>,
    #[serde(default)]
    pub total_episodes: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<SeasonInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeasonInfo {
    pub season_number: u32, // 0 = specials
    #[serde(default)]
    pub episode_count: Option<u32>,
    #[serde(default)]
    pub episode_numbers: Option<Vec<u32>>,
}

impl SeriesInfo {
    pub fn from_totals(season_count: u32, total_episodes: u32) -> Self {
        Self {
            season_count: Some(season_count),
            total_episodes: Some(total_episodes),
            seasons: Vec::new(),
        }
    }

    pub fn from_seasons(seasons: Vec<SeasonInfo>) -> Self {
        Self {
            season_count: Some(seasons.iter().filter(|s| s.season_number > 0).count() as u32),
            total_episodes: None,
            seasons,
        }
    }
}

impl SeasonInfo {
    pub fn with_count(season_number: u32, episode_count: u32) -> Self {
        Self {
            season_number,
            episode_count: Some(episode_count),
            episode_numbers: None,
        }
    }

    pub fn with_numbers(season_number: u32, episode_numbers: Vec<u32>) -> Self {
        Self {
            season_number,
            episode_count: Some(episode_numbers.len() as u32),
            episode_numbers: Some(episode_numbers),
        }
    }
}
