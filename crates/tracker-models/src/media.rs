use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection-wide identifier. Assigned from the creation time in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn value(self) -> i64 {
        self.0
    }

    /// Ids of zero or below never come out of the allocator; legacy data may still carry them.
    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(ItemId)
            .map_err(|_| format!("Invalid item id: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaKind {
    /// Label used on the wire and matched by collection search.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    /// Strict parse of the stored label ("movie" / "tv").
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Series),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "Movie"),
            MediaKind::Series => write!(f, "TV"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "film" => Ok(MediaKind::Movie),
            "tv" | "series" | "show" => Ok(MediaKind::Series),
            _ => Err(format!("Unrecognized media kind: {}. Use 'movie' or 'tv'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_match_wire_format() {
        assert_eq!(serde_json::to_string(&MediaKind::Series).unwrap(), "\"tv\"");
        assert_eq!(MediaKind::from_label("movie"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::from_label("Movie"), None);
    }

    #[test]
    fn test_from_str_is_lenient() {
        assert_eq!("Series".parse::<MediaKind>().unwrap(), MediaKind::Series);
        assert_eq!(" film ".parse::<MediaKind>().unwrap(), MediaKind::Movie);
        assert!("podcast".parse::<MediaKind>().is_err());
    }
}
