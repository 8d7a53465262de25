use serde::{Deserialize, Serialize};
use std::fmt;

/// Natural key of an episode within one show. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpisodeKey {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub season: u32,
    pub episode: u32,
    #[serde(default)]
    pub watched: bool,
    #[serde(default)]
    pub episode_id: String, // Cached "<season>-<episode>" lookup key
}

impl Episode {
    pub fn new(season: u32, episode: u32) -> Self {
        Self {
            season,
            episode,
            watched: false,
            episode_id: format!("{}-{}", season, episode),
        }
    }

    pub fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.season, self.episode)
    }
}
