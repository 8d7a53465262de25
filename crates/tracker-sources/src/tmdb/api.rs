// TMDB v3 response shapes and their conversion into provider-neutral types.

use super::{CAST_LIMIT, PROVIDER_NAME};
use crate::error::SourceError;
use crate::types::{SearchResult, TitleDetails};
use chrono::{SubsecRound, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use tracker_models::{ExternalMetadata, MediaKind, SeasonInfo, SeriesInfo};

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchItem>,
}

/// Movie results carry `title`/`release_date`, TV results `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
pub struct CastMember {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MovieDetails {
    pub id: u64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f32>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub status: Option<String>,
    #[serde(default)]
    pub credits: Credits,
}

#[derive(Debug, Deserialize)]
pub struct TvDetails {
    pub id: u64,
    pub name: Option<String>,
    pub first_air_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f32>,
    #[serde(default)]
    pub episode_run_time: Vec<u32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    pub status: Option<String>,
    pub number_of_seasons: Option<u32>,
    pub number_of_episodes: Option<u32>,
    #[serde(default)]
    pub credits: Credits,
}

#[derive(Debug, Deserialize)]
pub struct SeasonDetails {
    pub season_number: u32,
    #[serde(default)]
    pub episodes: Vec<EpisodeSummary>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeSummary {
    pub episode_number: u32,
}

/// GET `url` and decode the JSON body, turning non-2xx answers into
/// `SourceError::Status` with TMDB's `status_message` when present.
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, SourceError> {
    debug!("GET {}", url);
    let response = client.get(url).query(query).send().await?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("status_message").and_then(|m| m.as_str()).map(str::to_string))
            .unwrap_or(body);
        return Err(SourceError::Status {
            provider: PROVIDER_NAME.to_string(),
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|source| SourceError::Decode {
        provider: PROVIDER_NAME.to_string(),
        source,
    })
}

/// "2017-12-01" -> 2017
pub fn year_from_date(date: Option<&str>) -> Option<u32> {
    date.and_then(|d| d.get(..4))
        .and_then(|y| y.parse().ok())
        .filter(|y| *y > 0)
}

/// One decimal place, zero treated as unrated.
fn round_rating(rating: Option<f32>) -> Option<f32> {
    rating
        .filter(|r| *r > 0.0)
        .map(|r| (r * 10.0).round() / 10.0)
}

/// `poster_base` already includes the size segment, e.g. ".../t/p/w500".
fn poster_url(poster_base: &str, poster_path: Option<&str>) -> Option<String> {
    poster_path
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}", poster_base.trim_end_matches('/'), p.trim_start_matches('/')))
}

fn genre_names(genres: Vec<Genre>) -> Vec<String> {
    genres.into_iter().map(|g| g.name).collect()
}

fn top_cast(credits: Credits) -> Vec<String> {
    credits
        .cast
        .into_iter()
        .take(CAST_LIMIT)
        .map(|c| c.name)
        .collect()
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

pub fn search_result(item: SearchItem, kind: MediaKind) -> SearchResult {
    let (title, date) = match kind {
        MediaKind::Movie => (item.title.or(item.name), item.release_date),
        MediaKind::Series => (item.name.or(item.title), item.first_air_date),
    };
    SearchResult {
        external_id: item.id,
        title: title.unwrap_or_else(|| format!("Unknown ({})", item.id)),
        media_kind: kind,
        year: year_from_date(date.as_deref()),
        overview: non_empty(item.overview),
        rating: round_rating(item.vote_average),
    }
}

pub fn movie_details(raw: MovieDetails, poster_base: &str) -> TitleDetails {
    let metadata = ExternalMetadata {
        overview: non_empty(raw.overview),
        poster: poster_url(poster_base, raw.poster_path.as_deref()),
        rating: round_rating(raw.vote_average),
        runtime: raw.runtime.filter(|r| *r > 0),
        genres: genre_names(raw.genres),
        cast: top_cast(raw.credits),
        status: raw.status,
        total_seasons: None,
        total_episodes: None,
        fetched_at: Some(Utc::now().trunc_subsecs(3)),
    };

    TitleDetails {
        external_id: raw.id,
        title: raw.title.unwrap_or_else(|| "Unknown Movie".to_string()),
        media_kind: MediaKind::Movie,
        year: year_from_date(raw.release_date.as_deref()),
        metadata,
        series: None,
    }
}

/// `seasons` holds whichever season requests succeeded. Their episode lists
/// win over the show-level counts.
pub fn tv_details(raw: TvDetails, seasons: Vec<SeasonDetails>, poster_base: &str) -> TitleDetails {
    let season_infos: Vec<SeasonInfo> = seasons
        .into_iter()
        .filter(|s| s.season_number > 0)
        .map(|s| {
            let numbers = s.episodes.iter().map(|e| e.episode_number).collect();
            SeasonInfo::with_numbers(s.season_number, numbers)
        })
        .collect();

    let season_count = raw.number_of_seasons.filter(|n| *n > 0);
    let loaded_episodes: u32 = season_infos
        .iter()
        .filter_map(|s| s.episode_count)
        .sum();
    let total_episodes = if loaded_episodes > 0 {
        Some(loaded_episodes)
    } else {
        raw.number_of_episodes.filter(|n| *n > 0)
    };

    let metadata = ExternalMetadata {
        overview: non_empty(raw.overview),
        poster: poster_url(poster_base, raw.poster_path.as_deref()),
        rating: round_rating(raw.vote_average),
        runtime: raw.episode_run_time.first().copied().filter(|r| *r > 0),
        genres: genre_names(raw.genres),
        cast: top_cast(raw.credits),
        status: raw.status,
        total_seasons: season_count,
        total_episodes,
        fetched_at: Some(Utc::now().trunc_subsecs(3)),
    };

    TitleDetails {
        external_id: raw.id,
        title: raw.name.unwrap_or_else(|| "Unknown TV Show".to_string()),
        media_kind: MediaKind::Series,
        year: year_from_date(raw.first_air_date.as_deref()),
        metadata,
        series: Some(SeriesInfo {
            season_count,
            total_episodes,
            seasons: season_infos,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const IMAGES: &str = "https://image.tmdb.org/t/p/w500";

    #[test]
    fn test_search_results_for_both_kinds() {
        let response: SearchResponse = serde_json::from_value(json!({
            "page": 1,
            "results": [
                {"id": 949, "title": "Heat", "release_date": "1995-12-15", "overview": "", "vote_average": 7.94},
                {"id": 70523, "name": "Dark", "first_air_date": "2017-12-01", "vote_average": 0.0}
            ]
        }))
        .unwrap();
        let mut results = response.results.into_iter();

        let heat = search_result(results.next().unwrap(), MediaKind::Movie);
        assert_eq!(heat.title, "Heat");
        assert_eq!(heat.year, Some(1995));
        assert_eq!(heat.overview, None);
        assert_eq!(heat.rating, Some(7.9));

        let dark = search_result(results.next().unwrap(), MediaKind::Series);
        assert_eq!(dark.title, "Dark");
        assert_eq!(dark.year, Some(2017));
        assert_eq!(dark.rating, None);
    }

    #[test]
    fn test_movie_details() {
        let raw: MovieDetails = serde_json::from_value(json!({
            "id": 949,
            "title": "Heat",
            "release_date": "1995-12-15",
            "overview": "Obsessive master thief Neil McCauley...",
            "poster_path": "/umSVjVdbVwtx5ryCA2QXL44Durm.jpg",
            "vote_average": 7.9,
            "runtime": 170,
            "genres": [{"id": 28, "name": "Action"}, {"id": 80, "name": "Crime"}],
            "status": "Released",
            "credits": {"cast": [
                {"name": "Al Pacino"}, {"name": "Robert De Niro"}, {"name": "Val Kilmer"},
                {"name": "Jon Voight"}, {"name": "Tom Sizemore"}, {"name": "Diane Venora"}
            ]}
        }))
        .unwrap();

        let details = movie_details(raw, IMAGES);
        assert_eq!(details.year, Some(1995));
        assert!(details.series.is_none());
        assert_eq!(details.metadata.cast.len(), CAST_LIMIT);
        assert_eq!(details.metadata.genres, vec!["Action", "Crime"]);
        assert_eq!(
            details.metadata.poster.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/umSVjVdbVwtx5ryCA2QXL44Durm.jpg")
        );
        assert_eq!(details.metadata.runtime, Some(170));
    }

    #[test]
    fn test_tv_details_prefer_loaded_seasons() {
        let raw: TvDetails = serde_json::from_value(json!({
            "id": 70523,
            "name": "Dark",
            "first_air_date": "2017-12-01",
            "episode_run_time": [60],
            "number_of_seasons": 3,
            "number_of_episodes": 26,
            "genres": [{"id": 18, "name": "Drama"}]
        }))
        .unwrap();
        let seasons: Vec<SeasonDetails> = serde_json::from_value(json!([
            {"season_number": 0, "episodes": [{"episode_number": 1}]},
            {"season_number": 1, "episodes": [{"episode_number": 1}, {"episode_number": 2}]},
            {"season_number": 3, "episodes": [{"episode_number": 1}]}
        ]))
        .unwrap();

        let details = tv_details(raw, seasons, IMAGES);
        let series = details.series.unwrap();
        assert_eq!(series.season_count, Some(3));
        assert_eq!(series.total_episodes, Some(3));
        assert_eq!(series.seasons.len(), 2);
        assert_eq!(details.metadata.runtime, Some(60));
        assert_eq!(details.metadata.total_episodes, Some(3));
    }

    #[test]
    fn test_tv_details_without_seasons_use_counts() {
        let raw: TvDetails = serde_json::from_value(json!({
            "id": 1, "name": "Show", "number_of_seasons": 2, "number_of_episodes": 15
        }))
        .unwrap();
        let series = tv_details(raw, Vec::new(), IMAGES).series.unwrap();
        assert_eq!(series, SeriesInfo::from_totals(2, 15));
    }

    #[test]
    fn test_year_from_date() {
        assert_eq!(year_from_date(Some("2017-12-01")), Some(2017));
        assert_eq!(year_from_date(Some("")), None);
        assert_eq!(year_from_date(None), None);
    }
}
