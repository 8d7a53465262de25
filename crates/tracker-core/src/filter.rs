use crate::store::year_from_title;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracker_models::{Item, MediaKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFilter {
    #[default]
    All,
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl MediaFilter {
    fn matches(self, kind: MediaKind) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Movie => kind == MediaKind::Movie,
            MediaFilter::Series => kind == MediaKind::Series,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchFilter {
    #[default]
    All,
    Watchlist,
    Watched,
}

impl FromStr for MediaFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(MediaFilter::All),
            "movie" | "movies" => Ok(MediaFilter::Movie),
            "tv" | "series" | "show" | "shows" => Ok(MediaFilter::Series),
            other => Err(format!("Unknown media filter '{}'. Expected all, movie or tv", other)),
        }
    }
}

impl WatchFilter {
    fn matches(self, watched: bool) -> bool {
        match self {
            WatchFilter::All => true,
            WatchFilter::Watchlist => !watched,
            WatchFilter::Watched => watched,
        }
    }
}

impl FromStr for WatchFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(WatchFilter::All),
            "watchlist" | "unwatched" => Ok(WatchFilter::Watchlist),
            "watched" => Ok(WatchFilter::Watched),
            other => Err(format!(
                "Unknown watch status '{}'. Expected all, watchlist or watched",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Most recently added first.
    #[default]
    #[serde(rename = "addedDate")]
    Added,
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "titleDesc")]
    TitleDesc,
    /// Newest release first.
    #[serde(rename = "year")]
    Year,
    #[serde(rename = "yearOld")]
    YearOld,
    /// Highest user rating first.
    #[serde(rename = "rating")]
    Rating,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        SortOrder::Added,
        SortOrder::Title,
        SortOrder::TitleDesc,
        SortOrder::Year,
        SortOrder::YearOld,
        SortOrder::Rating,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Added => "added",
            SortOrder::Title => "title",
            SortOrder::TitleDesc => "title-desc",
            SortOrder::Year => "year",
            SortOrder::YearOld => "year-old",
            SortOrder::Rating => "rating",
        }
    }

    fn compare(self, a: &Item, b: &Item) -> Ordering {
        match self {
            SortOrder::Added => b.id.cmp(&a.id),
            SortOrder::Title => compare_titles(a, b),
            SortOrder::TitleDesc => compare_titles(b, a),
            SortOrder::Year => sort_year(b).cmp(&sort_year(a)),
            SortOrder::YearOld => sort_year(a).cmp(&sort_year(b)),
            SortOrder::Rating => b.user_rating.cmp(&a.user_rating),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "added" | "addeddate" | "recent" => Ok(SortOrder::Added),
            "title" => Ok(SortOrder::Title),
            "title-desc" | "titledesc" => Ok(SortOrder::TitleDesc),
            "year" | "newest" => Ok(SortOrder::Year),
            "year-old" | "yearold" | "oldest" => Ok(SortOrder::YearOld),
            "rating" => Ok(SortOrder::Rating),
            other => Err(format!(
                "Unknown sort order '{}'. Expected one of: added, title, title-desc, year, year-old, rating",
                other
            )),
        }
    }
}

fn compare_titles(a: &Item, b: &Item) -> Ordering {
    a.title
        .to_lowercase()
        .cmp(&b.title.to_lowercase())
        .then_with(|| a.title.cmp(&b.title))
}

/// Unknown years sort as 0, i.e. last for newest-first.
fn sort_year(item: &Item) -> u32 {
    item.year.or_else(|| year_from_title(&item.title)).unwrap_or(0)
}

/// A list view over the collection: filters, search term and ordering.
///
/// Persisted as the last used selection, so every field tolerates absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemQuery {
    pub search: String,
    #[serde(rename = "mediaType")]
    pub media: MediaFilter,
    #[serde(rename = "watchStatus")]
    pub status: WatchFilter,
    /// Substring over item and provider genres; empty or "all" disables.
    pub genre: String,
    #[serde(rename = "sortBy")]
    pub sort: SortOrder,
}

impl ItemQuery {
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }

    /// Filter and sort `items`. Ties keep collection order.
    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        let search = self.search.trim().to_lowercase();
        let genre = self.genre.trim().to_lowercase();
        let genre = (!genre.is_empty() && genre != "all").then_some(genre);

        let mut matches: Vec<&Item> = items
            .iter()
            .filter(|item| self.media.matches(item.media_kind))
            .filter(|item| self.status.matches(item.watched))
            .filter(|item| search.is_empty() || matches_term(item, &search))
            .filter(|item| {
                genre
                    .as_deref()
                    .map_or(true, |g| item.all_genres().any(|ig| ig.to_lowercase().contains(g)))
            })
            .collect();

        matches.sort_by(|a, b| self.sort.compare(a, b));
        matches
    }
}

/// Case-insensitive substring over title, genres and the media-kind label.
/// `term` must already be lowercase.
pub(crate) fn matches_term(item: &Item, term: &str) -> bool {
    item.title.to_lowercase().contains(term)
        || item.genres.iter().any(|g| g.to_lowercase().contains(term))
        || item.media_kind.label().contains(term)
}

/// Distinct lowercase genres across items and provider metadata.
pub fn available_genres(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.all_genres())
        .map(|g| g.trim().to_lowercase())
        .filter(|g| !g.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tracker_models::{ExternalMetadata, ItemId};

    fn item(id: i64, title: &str, kind: MediaKind, year: Option<u32>, genres: &[&str]) -> Item {
        Item {
            id: ItemId(id),
            title: title.to_string(),
            media_kind: kind,
            year,
            genres: genres.iter().map(|g| g.to_string()).collect(),
            watched: false,
            user_rating: 0,
            user_review: String::new(),
            episodes: Vec::new(),
            external_id: None,
            metadata: None,
            created_at: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    fn sample() -> Vec<Item> {
        let mut heat = item(1, "Heat", MediaKind::Movie, Some(1995), &["Crime", "Thriller"]);
        heat.watched = true;
        heat.user_rating = 9;
        let mut dark = item(2, "Dark", MediaKind::Series, Some(2017), &[]);
        dark.metadata = Some(ExternalMetadata {
            genres: vec!["Mystery".to_string()],
            ..ExternalMetadata::default()
        });
        let alien = item(3, "Alien (1979)", MediaKind::Movie, None, &["Horror"]);
        vec![heat, dark, alien]
    }

    fn titles(items: Vec<&Item>) -> Vec<&str> {
        items.into_iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_default_query_lists_newest_first() {
        let items = sample();
        assert_eq!(titles(ItemQuery::default().apply(&items)), vec!["Alien (1979)", "Dark", "Heat"]);
    }

    #[test]
    fn test_media_and_status_filters() {
        let items = sample();
        let query = ItemQuery {
            media: MediaFilter::Movie,
            status: WatchFilter::Watchlist,
            ..ItemQuery::default()
        };
        assert_eq!(titles(query.apply(&items)), vec!["Alien (1979)"]);
    }

    #[test]
    fn test_genre_filter_includes_provider_genres() {
        let items = sample();
        let query = ItemQuery {
            genre: "myst".to_string(),
            ..ItemQuery::default()
        };
        assert_eq!(titles(query.apply(&items)), vec!["Dark"]);
    }

    #[test]
    fn test_year_sort_uses_title_suffix() {
        let items = sample();
        let query = ItemQuery {
            sort: SortOrder::YearOld,
            ..ItemQuery::default()
        };
        assert_eq!(titles(query.apply(&items)), vec!["Alien (1979)", "Heat", "Dark"]);
    }

    #[test]
    fn test_title_and_rating_sorts() {
        let items = sample();
        let by_title = ItemQuery {
            sort: SortOrder::Title,
            ..ItemQuery::default()
        };
        assert_eq!(titles(by_title.apply(&items)), vec!["Alien (1979)", "Dark", "Heat"]);

        let by_rating = ItemQuery {
            sort: SortOrder::Rating,
            ..ItemQuery::default()
        };
        assert_eq!(by_rating.apply(&items)[0].title, "Heat");
    }

    #[test]
    fn test_query_persists_in_storage_shape() {
        let query = ItemQuery {
            search: "dark".to_string(),
            media: MediaFilter::Series,
            sort: SortOrder::TitleDesc,
            ..ItemQuery::default()
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["mediaType"], "tv");
        assert_eq!(json["sortBy"], "titleDesc");

        let partial: ItemQuery = serde_json::from_str(r#"{"genre":"drama"}"#).unwrap();
        assert_eq!(partial.sort, SortOrder::Added);
        assert_eq!(partial.genre, "drama");
    }

    #[test]
    fn test_sort_order_parses_cli_labels() {
        for order in SortOrder::ALL {
            assert_eq!(order.label().parse::<SortOrder>().unwrap(), order);
        }
        assert!("popularity".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_filters_parse_cli_values() {
        assert_eq!("TV".parse::<MediaFilter>().unwrap(), MediaFilter::Series);
        assert_eq!("watchlist".parse::<WatchFilter>().unwrap(), WatchFilter::Watchlist);
        assert!("books".parse::<MediaFilter>().is_err());
    }

    #[test]
    fn test_available_genres_are_distinct_and_lowercase() {
        let mut items = sample();
        items[2].genres.push("crime".to_string());
        assert_eq!(
            available_genres(&items),
            vec!["crime", "horror", "mystery", "thriller"]
        );
    }
}
