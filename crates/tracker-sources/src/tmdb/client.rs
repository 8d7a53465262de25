use super::api::{self, MovieDetails, SearchResponse, SeasonDetails, TvDetails};
use super::{MIN_QUERY_LEN, PROVIDER_NAME};
use crate::error::SourceError;
use crate::traits::MetadataProvider;
use crate::types::{SearchResult, TitleDetails};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracker_config::Config;
use tracker_models::MediaKind;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
    poster_base: String,
    language: String,
    region: Option<String>,
}

impl TmdbClient {
    pub fn new(api_key: String, base_url: String, poster_base: String) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("reeltrack/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            poster_base,
            language: "en-US".to_string(),
            region: None,
        })
    }

    pub fn from_config(config: &Config, api_key: Option<String>) -> Result<Self, SourceError> {
        if !config.tmdb.enabled {
            return Err(SourceError::Disabled(PROVIDER_NAME.to_string()));
        }
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| SourceError::MissingApiKey(PROVIDER_NAME.to_string()))?;

        let mut client = Self::new(api_key, config.tmdb.base_url.clone(), config.poster_base())?;
        client.language = config.tmdb.language.clone();
        client.region = config.tmdb.region.clone();
        Ok(client)
    }

    fn params(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("language", self.language.clone()),
        ];
        params.extend_from_slice(extra);
        params
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&'static str, String)],
    ) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        api::get_json(&self.client, &url, &self.params(extra)).await
    }

    async fn season(&self, tv_id: u64, season_number: u32) -> Result<SeasonDetails, SourceError> {
        self.get(&format!("tv/{}/season/{}", tv_id, season_number), &[])
            .await
    }

    async fn tv_details(&self, tv_id: u64) -> Result<TitleDetails, SourceError> {
        let raw: TvDetails = self
            .get(&format!("tv/{}", tv_id), &[("append_to_response", "credits".to_string())])
            .await?;

        let season_count = raw.number_of_seasons.unwrap_or(0);
        let results = join_all((1..=season_count).map(|n| self.season(tv_id, n))).await;

        let mut seasons = Vec::with_capacity(results.len());
        for (n, result) in (1..).zip(results) {
            match result {
                Ok(season) => seasons.push(season),
                Err(e) => warn!("Failed to load season {} of TV show {}: {}", n, tv_id, e),
            }
        }
        debug!(
            "Loaded {}/{} seasons for TV show {}",
            seasons.len(),
            season_count,
            tv_id
        );

        Ok(api::tv_details(raw, seasons, &self.poster_base))
    }

    async fn movie_details(&self, movie_id: u64) -> Result<TitleDetails, SourceError> {
        let raw: MovieDetails = self
            .get(
                &format!("movie/{}", movie_id),
                &[("append_to_response", "credits".to_string())],
            )
            .await?;
        Ok(api::movie_details(raw, &self.poster_base))
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn search(&self, query: &str, kind: MediaKind) -> Result<Vec<SearchResult>, SourceError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Err(SourceError::InvalidQuery(format!(
                "search query must be at least {} characters",
                MIN_QUERY_LEN
            )));
        }

        let path = match kind {
            MediaKind::Movie => "search/movie",
            MediaKind::Series => "search/tv",
        };
        let mut extra = vec![
            ("query", query.to_string()),
            ("include_adult", "false".to_string()),
        ];
        if let Some(region) = &self.region {
            extra.push(("region", region.clone()));
        }

        let response: SearchResponse = self.get(path, &extra).await?;
        let results: Vec<SearchResult> = response
            .results
            .into_iter()
            .map(|item| api::search_result(item, kind))
            .collect();

        info!("TMDB search '{}' ({}): {} results", query, kind.label(), results.len());
        Ok(results)
    }

    async fn details(&self, external_id: u64, kind: MediaKind) -> Result<TitleDetails, SourceError> {
        match kind {
            MediaKind::Movie => self.movie_details(external_id).await,
            MediaKind::Series => self.tv_details(external_id).await,
        }
    }
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_key_and_enabled() {
        let mut config = Config::default();
        assert!(matches!(
            TmdbClient::from_config(&config, None),
            Err(SourceError::MissingApiKey(_))
        ));
        assert!(matches!(
            TmdbClient::from_config(&config, Some("  ".to_string())),
            Err(SourceError::MissingApiKey(_))
        ));

        config.tmdb.enabled = false;
        assert!(matches!(
            TmdbClient::from_config(&config, Some("key".to_string())),
            Err(SourceError::Disabled(_))
        ));
    }

    #[tokio::test]
    async fn test_short_query_is_rejected_before_any_request() {
        let client = TmdbClient::from_config(&Config::default(), Some("key".to_string())).unwrap();
        let err = client.search(" a ", MediaKind::Movie).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidQuery(_)));
    }
}
