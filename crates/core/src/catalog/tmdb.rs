//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access, sent as the `api_key` query
//! parameter on every request.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{CastMember, Genre, Movie, MovieDetail, MoviePage, Video};
use super::{validate_discover_query, validate_search_query, CatalogError, MovieCatalog};
use crate::filter::DiscoverQuery;
use crate::metrics::CATALOG_REQUESTS;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters/backdrops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// Response language (e.g. "en-US"); catalog default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl TmdbConfig {
    /// Create a config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            image_base_url: None,
            language: None,
            timeout_secs: default_timeout(),
        }
    }

    /// The image base URL, falling back to the public TMDB image host.
    pub fn image_base_url(&self) -> &str {
        self.image_base_url
            .as_deref()
            .unwrap_or(DEFAULT_IMAGE_BASE_URL)
    }
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    language: Option<String>,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.is_empty() {
            return Err(CatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            language: config.language,
        })
    }

    /// Issue a GET and decode the JSON body.
    ///
    /// `not_found` is the resource description reported for a 404; when it
    /// is `None` a 404 is treated as any other API error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&str, String)],
        not_found: Option<String>,
    ) -> Result<T, CatalogError> {
        let result = self.send_and_decode(path, params, not_found).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        CATALOG_REQUESTS
            .with_label_values(&[operation, outcome])
            .inc();
        result
    }

    async fn send_and_decode<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        not_found: Option<String>,
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .get(&url)
            .query(&[("api_key", &self.api_key)])
            .query(params);

        if let Some(language) = &self.language {
            request = request.query(&[("language", language)]);
        }

        let response = check_status(request.send().await?, not_found).await?;

        response.json().await.map_err(|e| {
            CatalogError::ParseError(format!("Failed to parse response from {}: {}", path, e))
        })
    }
}

async fn check_status(
    response: Response,
    not_found: Option<String>,
) -> Result<Response, CatalogError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(CatalogError::NotConfigured(
            "Invalid TMDB API key".to_string(),
        ));
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CatalogError::RateLimitExceeded);
    }
    if status == StatusCode::NOT_FOUND {
        if let Some(resource) = not_found {
            return Err(CatalogError::NotFound(resource));
        }
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn fetch_trending(&self, page: u32) -> Result<MoviePage, CatalogError> {
        debug!("TMDB trending: page={}", page);

        let response: TmdbPagedResponse<TmdbMovieResult> = self
            .get_json(
                "trending",
                "/trending/movie/week",
                &[("page", page.to_string())],
                None,
            )
            .await?;

        Ok(response.into())
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage, CatalogError> {
        let query = validate_search_query(query)?;

        debug!("TMDB movie search: query='{}', page={}", query, page);

        let response: TmdbPagedResponse<TmdbMovieResult> = self
            .get_json(
                "search",
                "/search/movie",
                &[("query", query.to_string()), ("page", page.to_string())],
                None,
            )
            .await?;

        Ok(response.into())
    }

    async fn discover(&self, query: &DiscoverQuery) -> Result<MoviePage, CatalogError> {
        validate_discover_query(query)?;

        debug!(
            "TMDB discover: genres={}, sort={}, page={}",
            query.filter.genre_list(),
            query.filter.sort,
            query.page
        );

        let response: TmdbPagedResponse<TmdbMovieResult> = self
            .get_json(
                "discover",
                "/discover/movie",
                &query.to_query_params(),
                None,
            )
            .await?;

        Ok(response.into())
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        debug!("TMDB genre list");

        let response: TmdbGenreList = self
            .get_json("genres", "/genre/movie/list", &[], None)
            .await?;

        Ok(response.genres)
    }

    async fn fetch_detail(&self, movie_id: u32) -> Result<MovieDetail, CatalogError> {
        debug!("TMDB get movie: id={}", movie_id);

        let details: TmdbMovieDetails = self
            .get_json(
                "detail",
                &format!("/movie/{}", movie_id),
                &[("append_to_response", "videos,credits".to_string())],
                Some(format!("Movie ID {}", movie_id)),
            )
            .await?;

        Ok(details.into())
    }
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbPagedResponse<T> {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default = "first_page")]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    #[serde(default)]
    title: String,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
    #[serde(default)]
    genre_ids: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u32,
    #[serde(default)]
    title: String,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f32>,
    vote_count: Option<u32>,
    runtime: Option<u32>,
    tagline: Option<String>,
    #[serde(default)]
    genres: Vec<Genre>,
    videos: Option<TmdbVideoList>,
    credits: Option<TmdbCredits>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideoList {
    #[serde(default)]
    results: Vec<TmdbVideoResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideoResult {
    key: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    site: String,
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbCastResult {
    id: u32,
    name: String,
    character: Option<String>,
    profile_path: Option<String>,
    order: Option<u32>,
}

// ============================================================================
// Conversions
// ============================================================================

/// TMDB sends `""` for unknown release dates.
fn parse_release_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
}

impl From<TmdbMovieResult> for Movie {
    fn from(r: TmdbMovieResult) -> Self {
        Self {
            id: r.id,
            title: r.title,
            overview: r.overview.unwrap_or_default(),
            release_date: parse_release_date(r.release_date),
            poster_path: r.poster_path,
            backdrop_path: r.backdrop_path,
            vote_average: r.vote_average.unwrap_or(0.0),
            vote_count: r.vote_count.unwrap_or(0),
            genre_ids: r.genre_ids,
        }
    }
}

impl From<TmdbPagedResponse<TmdbMovieResult>> for MoviePage {
    fn from(r: TmdbPagedResponse<TmdbMovieResult>) -> Self {
        Self {
            results: r.results.into_iter().map(|m| m.into()).collect(),
            page: r.page.max(1),
            total_pages: r.total_pages.max(1),
            total_results: r.total_results,
        }
    }
}

impl From<TmdbMovieDetails> for MovieDetail {
    fn from(d: TmdbMovieDetails) -> Self {
        let movie = Movie {
            id: d.id,
            title: d.title,
            overview: d.overview.unwrap_or_default(),
            release_date: parse_release_date(d.release_date),
            poster_path: d.poster_path,
            backdrop_path: d.backdrop_path,
            vote_average: d.vote_average.unwrap_or(0.0),
            vote_count: d.vote_count.unwrap_or(0),
            genre_ids: d.genres.iter().map(|g| g.id).collect(),
        };

        Self {
            movie,
            runtime_minutes: d.runtime.filter(|r| *r > 0),
            tagline: d.tagline.filter(|t| !t.is_empty()),
            genres: d.genres,
            videos: d
                .videos
                .map(|v| v.results.into_iter().map(|r| r.into()).collect())
                .unwrap_or_default(),
            cast: d
                .credits
                .map(|c| c.cast.into_iter().map(|r| r.into()).collect())
                .unwrap_or_default(),
        }
    }
}

impl From<TmdbVideoResult> for Video {
    fn from(v: TmdbVideoResult) -> Self {
        Self {
            key: v.key,
            name: v.name,
            site: v.site,
            kind: v.kind,
        }
    }
}

impl From<TmdbCastResult> for CastMember {
    fn from(c: TmdbCastResult) -> Self {
        Self {
            id: c.id,
            name: c.name,
            character: c.character.unwrap_or_default(),
            profile_path: c.profile_path,
            order: c.order.unwrap_or(u32::MAX),
        }
    }
}
