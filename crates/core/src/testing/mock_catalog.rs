//! Mock movie catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};

use crate::catalog::{
    validate_discover_query, validate_search_query, CatalogError, Genre, Movie, MovieCatalog,
    MovieDetail, MoviePage,
};
use crate::filter::DiscoverQuery;

const DEFAULT_PAGE_SIZE: usize = 20;

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone)]
pub enum RecordedCatalogQuery {
    Trending { page: u32 },
    Search { query: String, page: u32 },
    Discover { query: DiscoverQuery },
    Genres,
    Detail { movie_id: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Gate {
    Trending(u32),
    Search(String),
    Discover(u32),
    Detail(u32),
}

/// Mock implementation of the MovieCatalog trait.
///
/// Serves one in-memory movie list for every listing operation:
/// - trending returns it as-is, paginated
/// - search keeps titles containing the query (case-insensitive)
/// - discover keeps movies with every selected genre inside the year and
///   rating bounds
///
/// Requests can be held open with the `hold_*` methods to test
/// interleavings; the returned [`Notify`] releases the held request.
///
/// # Example
///
/// ```rust,ignore
/// use reelscout_core::testing::{MockCatalog, fixtures};
///
/// let catalog = MockCatalog::new();
/// catalog.set_movies(fixtures::movies(1..=30, "Movie", 28)).await;
///
/// let page = catalog.fetch_trending(2).await?;
/// assert_eq!(page.results.len(), 10);
/// ```
#[derive(Debug)]
pub struct MockCatalog {
    movies: Arc<RwLock<Vec<Movie>>>,
    page_size: Arc<RwLock<usize>>,
    genres: Arc<RwLock<Vec<Genre>>>,
    details: Arc<RwLock<HashMap<u32, MovieDetail>>>,
    gates: Arc<RwLock<HashMap<Gate, Arc<Notify>>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(Vec::new())),
            page_size: Arc::new(RwLock::new(DEFAULT_PAGE_SIZE)),
            genres: Arc::new(RwLock::new(Vec::new())),
            details: Arc::new(RwLock::new(HashMap::new())),
            gates: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Data Configuration
    // =========================================================================

    /// Add a movie to the listing.
    pub async fn add_movie(&self, movie: Movie) {
        self.movies.write().await.push(movie);
    }

    /// Replace the listing.
    pub async fn set_movies(&self, movies: Vec<Movie>) {
        *self.movies.write().await = movies;
    }

    /// Set how many movies each page holds.
    pub async fn set_page_size(&self, page_size: usize) {
        *self.page_size.write().await = page_size.max(1);
    }

    /// Set the genre taxonomy.
    pub async fn set_genres(&self, genres: Vec<Genre>) {
        *self.genres.write().await = genres;
    }

    /// Add a movie detail.
    pub async fn add_detail(&self, detail: MovieDetail) {
        self.details.write().await.insert(detail.movie.id, detail);
    }

    // =========================================================================
    // Request Gates
    // =========================================================================

    async fn hold(&self, gate: Gate) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.write().await.insert(gate, notify.clone());
        notify
    }

    /// Hold the next trending request for `page` until notified.
    pub async fn hold_trending(&self, page: u32) -> Arc<Notify> {
        self.hold(Gate::Trending(page)).await
    }

    /// Hold the next search for `query` (any page) until notified.
    pub async fn hold_search(&self, query: &str) -> Arc<Notify> {
        self.hold(Gate::Search(query.trim().to_string())).await
    }

    /// Hold the next discovery request for `page` until notified.
    pub async fn hold_discover(&self, page: u32) -> Arc<Notify> {
        self.hold(Gate::Discover(page)).await
    }

    /// Hold the next detail request for `movie_id` until notified.
    pub async fn hold_detail(&self, movie_id: u32) -> Arc<Notify> {
        self.hold(Gate::Detail(movie_id)).await
    }

    async fn pass_gate(&self, gate: Gate) {
        let notify = self.gates.write().await.remove(&gate);
        if let Some(notify) = notify {
            notify.notified().await;
        }
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    /// Get the number of queries performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Record the query, then fail if an error was injected.
    async fn begin(&self, query: RecordedCatalogQuery) -> Result<(), CatalogError> {
        self.queries.write().await.push(query);
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn paginate(&self, movies: Vec<Movie>, page: u32) -> MoviePage {
        let page_size = *self.page_size.read().await;
        let total = movies.len();
        let total_pages = total.div_ceil(page_size).max(1) as u32;
        let start = (page.max(1) as usize - 1) * page_size;

        let results = movies.into_iter().skip(start).take(page_size).collect();
        let mut page = MoviePage::new(results, page, total_pages);
        page.total_results = total as u32;
        page
    }
}

fn matches_discover(movie: &Movie, query: &DiscoverQuery) -> bool {
    let filter = &query.filter;
    if !filter.genres.iter().all(|g| movie.genre_ids.contains(g)) {
        return false;
    }
    if let Some(year) = movie.year() {
        if year < filter.years.min || year > filter.years.max {
            return false;
        }
    }
    movie.vote_average >= filter.rating.min && movie.vote_average <= filter.rating.max
}

#[async_trait]
impl MovieCatalog for MockCatalog {
    async fn fetch_trending(&self, page: u32) -> Result<MoviePage, CatalogError> {
        self.begin(RecordedCatalogQuery::Trending { page }).await?;
        self.pass_gate(Gate::Trending(page)).await;

        let movies = self.movies.read().await.clone();
        Ok(self.paginate(movies, page).await)
    }

    async fn search_movies(&self, query: &str, page: u32) -> Result<MoviePage, CatalogError> {
        let query = validate_search_query(query)?;
        self.begin(RecordedCatalogQuery::Search {
            query: query.to_string(),
            page,
        })
        .await?;
        self.pass_gate(Gate::Search(query.to_string())).await;

        let needle = query.to_lowercase();
        let movies = self
            .movies
            .read()
            .await
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(self.paginate(movies, page).await)
    }

    async fn discover(&self, query: &DiscoverQuery) -> Result<MoviePage, CatalogError> {
        validate_discover_query(query)?;
        self.begin(RecordedCatalogQuery::Discover {
            query: query.clone(),
        })
        .await?;
        self.pass_gate(Gate::Discover(query.page)).await;

        let movies = self
            .movies
            .read()
            .await
            .iter()
            .filter(|m| matches_discover(m, query))
            .cloned()
            .collect();
        Ok(self.paginate(movies, query.page).await)
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        self.begin(RecordedCatalogQuery::Genres).await?;
        Ok(self.genres.read().await.clone())
    }

    async fn fetch_detail(&self, movie_id: u32) -> Result<MovieDetail, CatalogError> {
        self.begin(RecordedCatalogQuery::Detail { movie_id }).await?;
        self.pass_gate(Gate::Detail(movie_id)).await;

        if let Some(detail) = self.details.read().await.get(&movie_id) {
            return Ok(detail.clone());
        }

        self.movies
            .read()
            .await
            .iter()
            .find(|m| m.id == movie_id)
            .map(|movie| MovieDetail {
                movie: movie.clone(),
                runtime_minutes: None,
                tagline: None,
                genres: Vec::new(),
                videos: Vec::new(),
                cast: Vec::new(),
            })
            .ok_or_else(|| CatalogError::NotFound(format!("movie {}", movie_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterBuilder, FilterInput};
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_pagination() {
        let catalog = MockCatalog::new();
        catalog.set_movies(fixtures::movies(1..=25, "Movie", 28)).await;
        catalog.set_page_size(10).await;

        let page = catalog.fetch_trending(3).await.unwrap();
        assert_eq!(page.results.len(), 5);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_results, 25);
    }

    #[tokio::test]
    async fn test_empty_listing_has_one_page() {
        let catalog = MockCatalog::new();
        let page = catalog.fetch_trending(1).await.unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_blank_search_not_recorded() {
        let catalog = MockCatalog::new();
        let result = catalog.search_movies("  ", 1).await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));
        assert_eq!(catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_discover_requires_all_genres() {
        let catalog = MockCatalog::new();
        catalog
            .set_movies(vec![
                fixtures::movie_with_genres(1, "Both", 2010, &[28, 35]),
                fixtures::movie_with_genres(2, "Action", 2010, &[28]),
            ])
            .await;

        let filter = FilterBuilder::with_current_year(2024).build(FilterInput::with_genres([28, 35]));
        let page = catalog.discover(&DiscoverQuery::new(filter, 1)).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, 1);
    }

    #[tokio::test]
    async fn test_next_error_consumed_once() {
        let catalog = MockCatalog::new();
        catalog.set_next_error(CatalogError::RateLimitExceeded).await;

        assert!(catalog.fetch_genres().await.is_err());
        assert!(catalog.fetch_genres().await.is_ok());
        assert_eq!(catalog.query_count().await, 2);
    }

    #[tokio::test]
    async fn test_detail_falls_back_to_listing() {
        let catalog = MockCatalog::new();
        catalog.add_movie(fixtures::movie(7, "Se7en", 1995)).await;

        let detail = catalog.fetch_detail(7).await.unwrap();
        assert_eq!(detail.movie.title, "Se7en");
        assert!(detail.videos.is_empty());

        assert!(catalog.fetch_detail(8).await.unwrap_err().is_not_found());
    }
}
