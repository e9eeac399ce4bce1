//! Movie catalog integration.
//!
//! This module provides the read-only client used to query the external
//! movie catalog (TMDB) for trending, searched and filtered listings, the
//! genre taxonomy and single-movie details.

mod tmdb;
mod types;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::filter::DiscoverQuery;

/// Errors that can occur when querying the movie catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing or rejected API key).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// Malformed local input; the request was never sent.
    #[error("Invalid request: {0}")]
    Validation(String),
}

impl CatalogError {
    /// Whether this is a network-class failure (transport, status or body).
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            CatalogError::HttpError(_)
                | CatalogError::RateLimitExceeded
                | CatalogError::ApiError { .. }
                | CatalogError::ParseError(_)
        )
    }

    /// Whether the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::HttpError(_) => "http",
            CatalogError::RateLimitExceeded => "rate_limited",
            CatalogError::NotFound(_) => "not_found",
            CatalogError::ApiError { .. } => "api",
            CatalogError::ParseError(_) => "parse",
            CatalogError::NotConfigured(_) => "not_configured",
            CatalogError::Validation(_) => "validation",
        }
    }
}

/// Trait for movie catalog clients.
///
/// Every method issues at most one request and never retries. Dropping the
/// returned future abandons the request.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Fetch one page of this week's trending movies.
    async fn fetch_trending(&self, page: u32) -> Result<MoviePage, CatalogError>;

    /// Search movies by title text.
    ///
    /// Fails with [`CatalogError::Validation`] if the query is blank.
    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage, CatalogError>;

    /// Discover movies matching a filter.
    ///
    /// Fails with [`CatalogError::Validation`] if no genre is selected.
    async fn discover(&self, query: &DiscoverQuery) -> Result<MoviePage, CatalogError>;

    /// Fetch the full genre taxonomy.
    async fn fetch_genres(&self) -> Result<Vec<Genre>, CatalogError>;

    /// Fetch a movie with its videos and credits.
    async fn fetch_detail(&self, movie_id: u32) -> Result<MovieDetail, CatalogError>;
}

/// Check the search precondition shared by every catalog implementation.
pub fn validate_search_query(query: &str) -> Result<&str, CatalogError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Validation(
            "search query must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

/// Check the discovery precondition shared by every catalog implementation.
pub fn validate_discover_query(query: &DiscoverQuery) -> Result<(), CatalogError> {
    if !query.filter.is_active() {
        return Err(CatalogError::Validation(
            "discovery requires at least one genre".to_string(),
        ));
    }
    Ok(())
}
