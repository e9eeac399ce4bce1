//! Catalog state manager.
//!
//! Owns the trending, search and filtered collections, the favorites set and
//! the cached genre taxonomy for one session. The presentation layer calls
//! the async operations and re-renders from [`CatalogManager::snapshot`].
//!
//! Catalog failures never propagate out of this module: they are logged,
//! turned into a user-facing message and reported as [`LoadOutcome::Failed`].
//! Responses to superseded requests are discarded on arrival.

mod request;
mod types;

pub use types::*;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, Genre, Movie, MovieCatalog, MovieDetail};
use crate::filter::{DiscoverQuery, FilterBuilder, FilterInput};
use crate::metrics::{FAVORITE_TOGGLES, STALE_RESPONSES, STORE_WRITE_FAILURES};
use crate::store::Preferences;

use request::{PendingRequests, RequestKey, RequestTag, Slot};

const TRENDING_ERROR: &str = "Failed to fetch trending movies. Please try again later.";
const SEARCH_ERROR: &str = "Failed to search movies. Please try again later.";
const FILTER_ERROR: &str = "Failed to apply filters. Please try again later.";
const LOAD_MORE_ERROR: &str = "Failed to load more movies. Please try again later.";
const GENRES_ERROR: &str = "Failed to load genres. Please try again later.";
const DETAIL_ERROR: &str = "Failed to load movie details. Please try again later.";
const DETAIL_NOT_FOUND: &str = "Movie not found.";
const FAVORITES_SAVE_ERROR: &str = "Could not save favorites.";
const SEARCH_SAVE_ERROR: &str = "Could not save your last search.";

#[derive(Debug, Default)]
struct ManagerState {
    trending: CollectionState,
    search: SearchState,
    filtered: FilteredState,
    favorites: FavoritesSet,
    genres: Option<Vec<Genre>>,
    detail: Option<MovieDetail>,
    last_search: String,
    error: Option<String>,
    in_flight: usize,
    pending: PendingRequests,
}

impl ManagerState {
    fn begin(&mut self, slot: Slot, key: RequestKey) -> RequestTag {
        self.in_flight += 1;
        self.error = None;
        self.pending.issue(slot, key)
    }

    fn display(&self) -> DisplaySelection {
        if self.search.is_active() {
            DisplaySelection {
                source: CollectionKind::Search,
                title: format!("Search Results for \"{}\"", self.search.query),
                movies: self.search.results.movies.clone(),
                has_more: self.search.results.has_more(),
            }
        } else if self.filtered.is_active() {
            DisplaySelection {
                source: CollectionKind::Filter,
                title: "Filtered Movies".to_string(),
                movies: self.filtered.results.movies.clone(),
                has_more: self.filtered.results.has_more(),
            }
        } else {
            DisplaySelection {
                source: CollectionKind::Trending,
                title: "Trending Movies".to_string(),
                movies: self.trending.movies.clone(),
                has_more: self.trending.has_more(),
            }
        }
    }

    fn display_source(&self) -> CollectionKind {
        if self.search.is_active() {
            CollectionKind::Search
        } else if self.filtered.is_active() {
            CollectionKind::Filter
        } else {
            CollectionKind::Trending
        }
    }
}

/// An issued request that has not been resolved yet.
///
/// Dropping it unresolved (the caller abandoned the future) releases the
/// slot and the loading count so later requests are not blocked.
struct InFlight<'a> {
    state: &'a Mutex<ManagerState>,
    slot: Slot,
    tag: Option<RequestTag>,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<ManagerState>, slot: Slot, tag: RequestTag) -> Self {
        Self {
            state,
            slot,
            tag: Some(tag),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Some(tag) = self.tag.take() else {
            return;
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = state.in_flight.saturating_sub(1);
        state.pending.complete(self.slot, &tag);
        debug!("Abandoned {} request", self.slot.as_str());
    }
}

/// Client-side state manager for the movie catalog.
pub struct CatalogManager {
    catalog: Arc<dyn MovieCatalog>,
    preferences: Preferences,
    filter_builder: FilterBuilder,
    state: Mutex<ManagerState>,
}

impl CatalogManager {
    /// Create a manager, loading favorites and the last search from the store.
    pub fn new(catalog: Arc<dyn MovieCatalog>, preferences: Preferences) -> Self {
        Self::with_filter_builder(catalog, preferences, FilterBuilder::new())
    }

    /// Create a manager with a specific filter builder.
    pub fn with_filter_builder(
        catalog: Arc<dyn MovieCatalog>,
        preferences: Preferences,
        filter_builder: FilterBuilder,
    ) -> Self {
        let favorites = FavoritesSet::from_movies(preferences.load_favorites());
        let last_search = preferences.load_last_search();

        info!(
            "Catalog manager initialized with {} favorites",
            favorites.len()
        );

        let state = ManagerState {
            favorites,
            last_search,
            ..Default::default()
        };

        Self {
            catalog,
            preferences,
            filter_builder,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, slot: Slot, tag: RequestTag) -> InFlight<'_> {
        InFlight::new(&self.state, slot, tag)
    }

    /// Resolve a request: apply on success, record the message on failure,
    /// or drop the result if the request was superseded.
    fn finish<T>(
        &self,
        mut request: InFlight<'_>,
        result: Result<T, CatalogError>,
        apply: impl FnOnce(&mut ManagerState, T),
        error_message: impl FnOnce(&CatalogError) -> &'static str,
    ) -> LoadOutcome {
        let slot = request.slot;
        let Some(tag) = request.tag.take() else {
            return LoadOutcome::Discarded;
        };

        let mut state = self.state();
        state.in_flight = state.in_flight.saturating_sub(1);

        if !state.pending.complete(slot, &tag) {
            warn!("Discarding stale {} response", slot.as_str());
            STALE_RESPONSES.with_label_values(&[slot.as_str()]).inc();
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(value) => {
                apply(&mut *state, value);
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!("Catalog {} request failed: {}", slot.as_str(), e);
                state.error = Some(error_message(&e).to_string());
                LoadOutcome::Failed
            }
        }
    }

    // =========================================================================
    // Trending
    // =========================================================================

    /// Load a page of trending movies. Page 1 replaces, later pages append.
    pub async fn load_trending_page(&self, page: u32) -> LoadOutcome {
        let page = page.max(1);
        let tag = self
            .state()
            .begin(Slot::Trending, RequestKey::Trending { page });
        let request = self.track(Slot::Trending, tag);

        let result = self.catalog.fetch_trending(page).await;

        self.finish(
            request,
            result,
            |state, movies| state.trending.merge(movies),
            |_| TRENDING_ERROR,
        )
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Search by title. A blank query is ignored.
    ///
    /// Page 1 persists `query` as the last search when issued and makes it
    /// the active search once its results arrive. Later pages append and are
    /// only accepted for the active query.
    pub async fn search(&self, query: &str, page: u32) -> LoadOutcome {
        let query = query.trim();
        if query.is_empty() {
            debug!("Ignoring blank search");
            return LoadOutcome::Skipped;
        }
        let page = page.max(1);

        let tag = {
            let mut state = self.state();

            if page > 1 && state.search.query != query {
                debug!(
                    "Ignoring page {} for inactive search '{}'",
                    page, query
                );
                return LoadOutcome::Skipped;
            }

            let tag = state.begin(
                Slot::Search,
                RequestKey::Search {
                    query: query.to_string(),
                    page,
                },
            );

            if page == 1 {
                state.last_search = query.to_string();
                if let Err(e) = self.preferences.save_last_search(query) {
                    warn!("Failed to persist last search: {}", e);
                    STORE_WRITE_FAILURES.inc();
                    state.error = Some(SEARCH_SAVE_ERROR.to_string());
                }
            }

            tag
        };
        let request = self.track(Slot::Search, tag);

        let result = self.catalog.search_movies(query, page).await;

        let active = query.to_string();
        self.finish(
            request,
            result,
            move |state, movies| {
                if page == 1 {
                    state.search.query = active;
                }
                state.search.results.merge(movies);
            },
            |_| SEARCH_ERROR,
        )
    }

    /// Re-run the persisted last search, if there is one.
    pub async fn restore_last_search(&self) -> LoadOutcome {
        let last = self.state().last_search.clone();
        if last.trim().is_empty() {
            return LoadOutcome::Skipped;
        }
        info!("Restoring last search '{}'", last);
        self.search(&last, 1).await
    }

    /// Leave search mode and forget the last search.
    pub fn clear_search(&self) {
        let mut state = self.state();
        state.search = SearchState::default();
        state.last_search.clear();
        state.pending.invalidate(Slot::Search);

        if let Err(e) = self.preferences.clear_last_search() {
            warn!("Failed to clear persisted last search: {}", e);
            STORE_WRITE_FAILURES.inc();
            state.error = Some(SEARCH_SAVE_ERROR.to_string());
        }
    }

    // =========================================================================
    // Filtering
    // =========================================================================

    /// Apply a filter selection.
    ///
    /// With no genres selected, filtering is switched off and
    /// [`LoadOutcome::FilterCleared`] tells the caller to show trending.
    /// Otherwise the first page of the discovery query replaces the filtered
    /// collection; the filter only becomes active once that page arrives.
    pub async fn apply_filter(&self, input: FilterInput) -> LoadOutcome {
        let filter = self.filter_builder.build(input);

        if !filter.is_active() {
            let mut state = self.state();
            state.filtered = FilteredState::default();
            state.pending.invalidate(Slot::Filter);
            info!("Filter cleared, falling back to trending");
            return LoadOutcome::FilterCleared;
        }

        info!(
            "Applying filter: genres={}, years={}-{}, rating={}-{}, sort={}",
            filter.genre_list(),
            filter.years.min,
            filter.years.max,
            filter.rating.min,
            filter.rating.max,
            filter.sort
        );

        let query = DiscoverQuery::new(filter, 1);
        let tag = self.state().begin(
            Slot::Filter,
            RequestKey::Filter {
                query: query.clone(),
            },
        );
        let request = self.track(Slot::Filter, tag);

        let result = self.catalog.discover(&query).await;

        self.finish(
            request,
            result,
            move |state, movies| {
                state.filtered.filter = Some(query.filter);
                state.filtered.results.replace(movies);
            },
            |_| FILTER_ERROR,
        )
    }

    /// Fetch the next page of the filtered collection.
    ///
    /// A no-op when no filter is active, the last page has been reached, or
    /// a filtered request is already in flight.
    pub async fn load_more_filtered(&self) -> LoadOutcome {
        let (tag, query) = {
            let mut state = self.state();

            let Some(filter) = state.filtered.filter.clone() else {
                return LoadOutcome::Skipped;
            };
            if !state.filtered.results.has_more() || state.pending.is_pending(Slot::Filter) {
                return LoadOutcome::Skipped;
            }

            let query = DiscoverQuery::new(filter, state.filtered.results.next_page());
            let tag = state.begin(
                Slot::Filter,
                RequestKey::Filter {
                    query: query.clone(),
                },
            );
            (tag, query)
        };
        let request = self.track(Slot::Filter, tag);

        let result = self.catalog.discover(&query).await;

        self.finish(
            request,
            result,
            |state, movies| state.filtered.results.append(movies),
            |_| LOAD_MORE_ERROR,
        )
    }

    // =========================================================================
    // Infinite scroll
    // =========================================================================

    /// Fetch the next page of whichever collection is displayed.
    ///
    /// Called when the presentation layer's end-of-list sentinel becomes
    /// visible. A no-op at the last page or while that collection is loading.
    pub async fn load_more(&self) -> LoadOutcome {
        let (source, next) = {
            let mut state = self.state();
            let source = state.display_source();
            let next = match source {
                CollectionKind::Search => {
                    if !state.search.results.has_more() || state.pending.is_pending(Slot::Search)
                    {
                        return LoadOutcome::Skipped;
                    }
                    Some((state.search.query.clone(), state.search.results.next_page()))
                }
                CollectionKind::Filter => None,
                CollectionKind::Trending => {
                    if !state.trending.has_more() || state.pending.is_pending(Slot::Trending) {
                        return LoadOutcome::Skipped;
                    }
                    Some((String::new(), state.trending.next_page()))
                }
            };
            (source, next)
        };

        match (source, next) {
            (CollectionKind::Search, Some((query, page))) => self.search(&query, page).await,
            (CollectionKind::Trending, Some((_, page))) => self.load_trending_page(page).await,
            _ => self.load_more_filtered().await,
        }
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Add or remove a favorite and persist the result immediately.
    ///
    /// Returns `true` if the movie is a favorite afterwards.
    pub fn toggle_favorite(&self, movie: &Movie) -> bool {
        let mut state = self.state();
        let is_favorite = state.favorites.toggle(movie);

        FAVORITE_TOGGLES
            .with_label_values(&[if is_favorite { "added" } else { "removed" }])
            .inc();
        debug!(
            "Favorite {} '{}' ({})",
            if is_favorite { "added" } else { "removed" },
            movie.title,
            movie.id
        );

        if let Err(e) = self.preferences.save_favorites(state.favorites.as_slice()) {
            warn!("Failed to persist favorites: {}", e);
            STORE_WRITE_FAILURES.inc();
            state.error = Some(FAVORITES_SAVE_ERROR.to_string());
        }

        is_favorite
    }

    /// Whether a movie is bookmarked.
    pub fn is_favorite(&self, movie_id: u32) -> bool {
        self.state().favorites.contains(movie_id)
    }

    /// Bookmarked movies in insertion order.
    pub fn favorites(&self) -> Vec<Movie> {
        self.state().favorites.as_slice().to_vec()
    }

    // =========================================================================
    // Reference data and details
    // =========================================================================

    /// Fetch the genre taxonomy once per session.
    pub async fn load_genres(&self) -> LoadOutcome {
        let tag = {
            let mut state = self.state();
            if state.genres.is_some() {
                return LoadOutcome::Skipped;
            }
            state.begin(Slot::Genres, RequestKey::Genres)
        };
        let request = self.track(Slot::Genres, tag);

        let result = self.catalog.fetch_genres().await;

        self.finish(
            request,
            result,
            |state, genres| state.genres = Some(genres),
            |_| GENRES_ERROR,
        )
    }

    /// Cached genres (empty until loaded).
    pub fn genres(&self) -> Vec<Genre> {
        self.state().genres.clone().unwrap_or_default()
    }

    /// Fetch a movie's details into the detail slot.
    pub async fn load_detail(&self, movie_id: u32) -> LoadOutcome {
        let tag = self
            .state()
            .begin(Slot::Detail, RequestKey::Detail { movie_id });
        let request = self.track(Slot::Detail, tag);

        let result = self.catalog.fetch_detail(movie_id).await;

        self.finish(
            request,
            result,
            |state, detail| state.detail = Some(detail),
            |e| {
                if e.is_not_found() {
                    DETAIL_NOT_FOUND
                } else {
                    DETAIL_ERROR
                }
            },
        )
    }

    /// The last loaded movie detail.
    pub fn detail(&self) -> Option<MovieDetail> {
        self.state().detail.clone()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The collection to display, by precedence: search, filter, trending.
    pub fn display(&self) -> DisplaySelection {
        self.state().display()
    }

    /// Whether any request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.state().in_flight > 0
    }

    /// The current user-facing error message.
    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    /// Clear the error message.
    pub fn dismiss_error(&self) {
        self.state().error = None;
    }

    /// The active search query (empty when not searching).
    pub fn search_query(&self) -> String {
        self.state().search.query.clone()
    }

    /// A full copy of the current state.
    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state();
        CatalogSnapshot {
            trending: state.trending.clone(),
            search: state.search.clone(),
            filtered: state.filtered.clone(),
            favorites: state.favorites.as_slice().to_vec(),
            genres: state.genres.clone().unwrap_or_default(),
            detail: state.detail.clone(),
            last_search: state.last_search.clone(),
            loading: state.in_flight > 0,
            error: state.error.clone(),
            display: state.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use crate::filter::SortKey;
    use crate::store::{KeyValueStore, FAVORITES_KEY};
    use crate::testing::{fixtures, MemoryStore, MockCatalog, RecordedCatalogQuery};
    use tokio_test::{assert_pending, assert_ready_eq, task};

    struct Harness {
        manager: CatalogManager,
        catalog: Arc<MockCatalog>,
        store: Arc<MemoryStore>,
    }

    async fn harness() -> Harness {
        harness_with_store(Arc::new(MemoryStore::new())).await
    }

    async fn harness_with_store(store: Arc<MemoryStore>) -> Harness {
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_page_size(2).await;
        let manager = CatalogManager::with_filter_builder(
            catalog.clone(),
            Preferences::new(store.clone()),
            FilterBuilder::with_current_year(2024),
        );
        Harness {
            manager,
            catalog,
            store,
        }
    }

    #[tokio::test]
    async fn test_trending_replace_then_append() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=5, "Trend", 28)).await;

        assert_eq!(h.manager.load_trending_page(1).await, LoadOutcome::Applied);
        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.trending.movies.len(), 2);
        assert_eq!(snapshot.trending.total_pages, 3);

        assert_eq!(h.manager.load_trending_page(2).await, LoadOutcome::Applied);
        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.trending.movies.len(), 4);
        assert_eq!(snapshot.trending.page, 2);

        assert_eq!(h.manager.load_trending_page(1).await, LoadOutcome::Applied);
        assert_eq!(h.manager.snapshot().trending.movies.len(), 2);
        assert!(!h.manager.is_loading());
    }

    #[tokio::test]
    async fn test_trending_failure_keeps_state() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=4, "Trend", 28)).await;
        h.manager.load_trending_page(1).await;

        h.catalog
            .set_next_error(CatalogError::ApiError {
                status: 500,
                message: "boom".to_string(),
            })
            .await;
        assert_eq!(h.manager.load_trending_page(2).await, LoadOutcome::Failed);

        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.trending.movies.len(), 2);
        assert_eq!(snapshot.trending.page, 1);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some(TRENDING_ERROR));

        h.manager.dismiss_error();
        assert!(h.manager.error().is_none());
    }

    #[tokio::test]
    async fn test_blank_search_is_noop() {
        let h = harness().await;
        let before = h.manager.snapshot();

        assert_eq!(h.manager.search("", 1).await, LoadOutcome::Skipped);
        assert_eq!(h.manager.search("   ", 1).await, LoadOutcome::Skipped);

        assert_eq!(h.catalog.query_count().await, 0);
        let after = h.manager.snapshot();
        assert_eq!(after.search, before.search);
        assert_eq!(h.store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_search_persists_last_search() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=3, "Matrix", 878)).await;

        assert_eq!(h.manager.search(" matrix ", 1).await, LoadOutcome::Applied);
        assert_eq!(h.manager.search_query(), "matrix");
        assert_eq!(h.store.raw("lastSearch").as_deref(), Some("matrix"));

        assert_eq!(h.manager.search("matrix", 2).await, LoadOutcome::Applied);
        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.search.results.movies.len(), 3);
        assert!(!snapshot.search.results.has_more());
    }

    #[tokio::test]
    async fn test_later_page_for_other_query_ignored() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=3, "Matrix", 878)).await;
        h.manager.search("matrix", 1).await;

        assert_eq!(h.manager.search("alien", 2).await, LoadOutcome::Skipped);
        assert_eq!(h.catalog.query_count().await, 1);
    }

    #[tokio::test]
    async fn test_clear_search() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=3, "Matrix", 878)).await;
        h.manager.load_trending_page(1).await;
        h.manager.search("matrix", 1).await;

        h.manager.clear_search();

        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.search, SearchState::default());
        assert_eq!(snapshot.last_search, "");
        assert_eq!(h.store.raw("lastSearch"), None);
        assert_eq!(snapshot.trending.movies.len(), 2);
        assert_eq!(snapshot.display.source, CollectionKind::Trending);
    }

    #[tokio::test]
    async fn test_restore_last_search() {
        let store = Arc::new(MemoryStore::new());
        store.set("lastSearch", "matrix").unwrap();
        let h = harness_with_store(store).await;
        h.catalog.set_movies(fixtures::movies(1..=3, "Matrix", 878)).await;

        assert_eq!(h.manager.snapshot().last_search, "matrix");
        assert_eq!(h.manager.search_query(), "");

        assert_eq!(h.manager.restore_last_search().await, LoadOutcome::Applied);
        assert_eq!(h.manager.search_query(), "matrix");
        assert_eq!(h.manager.display().source, CollectionKind::Search);
    }

    #[tokio::test]
    async fn test_restore_without_last_search_skips() {
        let h = harness().await;
        assert_eq!(h.manager.restore_last_search().await, LoadOutcome::Skipped);
        assert_eq!(h.catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_empty_filter_clears_without_request() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=3, "Action", 28)).await;
        h.manager
            .apply_filter(FilterInput::with_genres([28]))
            .await;
        h.catalog.clear_recorded().await;

        let outcome = h.manager.apply_filter(FilterInput::default()).await;

        assert_eq!(outcome, LoadOutcome::FilterCleared);
        assert_eq!(h.catalog.query_count().await, 0);
        let snapshot = h.manager.snapshot();
        assert!(snapshot.filtered.filter.is_none());
        assert!(snapshot.filtered.results.is_empty());
        assert_eq!(snapshot.display.source, CollectionKind::Trending);
    }

    #[tokio::test]
    async fn test_apply_filter_builds_query() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=3, "Action", 28)).await;

        let input = FilterInput::with_genres([28])
            .years(2020, 1990)
            .sort_by("bogus");
        assert_eq!(h.manager.apply_filter(input).await, LoadOutcome::Applied);

        let queries = h.catalog.recorded_queries().await;
        match &queries[0] {
            RecordedCatalogQuery::Discover { query } => {
                assert_eq!(query.page, 1);
                assert_eq!(query.filter.years.min, 1990);
                assert_eq!(query.filter.years.max, 2020);
                assert_eq!(query.filter.sort, SortKey::PopularityDesc);
            }
            other => panic!("Expected Discover, got {:?}", other),
        }
        assert_eq!(h.manager.display().source, CollectionKind::Filter);
    }

    #[tokio::test]
    async fn test_filter_failure_keeps_previous_filter() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=3, "Action", 28)).await;
        h.manager.apply_filter(FilterInput::with_genres([28])).await;

        h.catalog
            .set_next_error(CatalogError::RateLimitExceeded)
            .await;
        assert_eq!(
            h.manager.apply_filter(FilterInput::with_genres([35])).await,
            LoadOutcome::Failed
        );

        let snapshot = h.manager.snapshot();
        let filter = snapshot.filtered.filter.unwrap();
        assert!(filter.genres.contains(&28));
        assert_eq!(snapshot.filtered.results.movies.len(), 2);
        assert_eq!(snapshot.error.as_deref(), Some(FILTER_ERROR));
    }

    #[tokio::test]
    async fn test_load_more_filtered_without_filter_skips() {
        let h = harness().await;
        assert_eq!(h.manager.load_more_filtered().await, LoadOutcome::Skipped);
        assert_eq!(h.catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_toggle_favorite_persists_every_time() {
        let h = harness().await;
        let movie = fixtures::movie(42, "Hitchhiker", 2005);

        assert!(h.manager.toggle_favorite(&movie));
        assert!(h.manager.is_favorite(42));
        assert_eq!(h.store.write_count(), 1);
        assert!(h.store.raw(FAVORITES_KEY).unwrap().contains("Hitchhiker"));

        assert!(!h.manager.toggle_favorite(&movie));
        assert!(!h.manager.is_favorite(42));
        assert_eq!(h.store.write_count(), 2);
        assert_eq!(h.store.raw(FAVORITES_KEY).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_favorite_write_failure_keeps_memory_state() {
        let h = harness().await;
        h.store.set_fail_writes(true);

        let movie = fixtures::movie(1, "Alien", 1979);
        assert!(h.manager.toggle_favorite(&movie));
        assert!(h.manager.is_favorite(1));
        assert_eq!(h.manager.error().as_deref(), Some(FAVORITES_SAVE_ERROR));
    }

    #[tokio::test]
    async fn test_favorites_loaded_at_startup() {
        let store = Arc::new(MemoryStore::new());
        Preferences::new(store.clone())
            .save_favorites(&[fixtures::movie(5, "Ran", 1985)])
            .unwrap();

        let h = harness_with_store(store).await;
        assert!(h.manager.is_favorite(5));
        assert_eq!(h.manager.favorites().len(), 1);
    }

    #[tokio::test]
    async fn test_genres_cached_for_session() {
        let h = harness().await;
        h.catalog.set_genres(fixtures::genres()).await;

        assert_eq!(h.manager.load_genres().await, LoadOutcome::Applied);
        assert_eq!(h.manager.load_genres().await, LoadOutcome::Skipped);
        assert_eq!(h.catalog.query_count().await, 1);
        assert_eq!(h.manager.genres(), fixtures::genres());
    }

    #[tokio::test]
    async fn test_detail_not_found_message() {
        let h = harness().await;
        assert_eq!(h.manager.load_detail(999).await, LoadOutcome::Failed);
        assert_eq!(h.manager.error().as_deref(), Some(DETAIL_NOT_FOUND));
        assert!(h.manager.detail().is_none());
    }

    #[tokio::test]
    async fn test_detail_loaded() {
        let h = harness().await;
        let movie = fixtures::movie(603, "The Matrix", 1999);
        h.catalog.add_detail(fixtures::movie_detail(movie)).await;

        assert_eq!(h.manager.load_detail(603).await, LoadOutcome::Applied);
        let detail = h.manager.detail().unwrap();
        assert_eq!(detail.movie.id, 603);
        assert!(detail.trailer().is_some());
    }

    #[tokio::test]
    async fn test_stale_search_discarded() {
        let h = harness().await;
        h.catalog
            .set_movies(vec![
                fixtures::movie(1, "alpha", 2001),
                fixtures::movie(2, "bravo", 2002),
            ])
            .await;
        let gate = h.catalog.hold_search("alpha").await;

        let mut first = task::spawn(h.manager.search("alpha", 1));
        assert_pending!(first.poll());
        assert!(h.manager.is_loading());

        assert_eq!(h.manager.search("bravo", 1).await, LoadOutcome::Applied);

        gate.notify_one();
        assert!(first.is_woken());
        assert_ready_eq!(first.poll(), LoadOutcome::Discarded);

        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.search.query, "bravo");
        assert_eq!(snapshot.search.results.movies.len(), 1);
        assert_eq!(snapshot.search.results.movies[0].title, "bravo");
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn test_clear_search_discards_in_flight() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=2, "alpha", 1)).await;
        let gate = h.catalog.hold_search("alpha").await;

        let mut pending = task::spawn(h.manager.search("alpha", 1));
        assert_pending!(pending.poll());

        h.manager.clear_search();
        gate.notify_one();
        assert_ready_eq!(pending.poll(), LoadOutcome::Discarded);

        assert_eq!(h.manager.snapshot().search, SearchState::default());
    }

    #[tokio::test]
    async fn test_load_more_skips_while_pending() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=6, "Trend", 28)).await;
        h.manager.load_trending_page(1).await;

        let gate = h.catalog.hold_trending(2).await;
        let mut in_flight = task::spawn(h.manager.load_more());
        assert_pending!(in_flight.poll());

        // Sentinel fires again while page 2 is loading
        assert_eq!(h.manager.load_more().await, LoadOutcome::Skipped);

        gate.notify_one();
        assert_ready_eq!(in_flight.poll(), LoadOutcome::Applied);
        assert_eq!(h.manager.snapshot().trending.movies.len(), 4);
    }

    #[tokio::test]
    async fn test_dropped_load_more_releases_slot() {
        let h = harness().await;
        h.catalog.set_movies(fixtures::movies(1..=6, "Trend", 28)).await;
        h.manager.load_trending_page(1).await;

        let _gate = h.catalog.hold_trending(2).await;
        let mut abandoned = task::spawn(h.manager.load_more());
        assert_pending!(abandoned.poll());
        assert!(h.manager.is_loading());
        drop(abandoned);

        assert!(!h.manager.is_loading());
        assert_eq!(h.manager.load_more().await, LoadOutcome::Applied);
        assert_eq!(h.manager.snapshot().trending.movies.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_search_keeps_previous_query() {
        let h = harness().await;
        let mut movies = fixtures::movies(1..=3, "alpha", 1);
        movies.extend(fixtures::movies(9..=10, "bravo", 1));
        h.catalog.set_movies(movies).await;

        assert_eq!(h.manager.search("alpha", 1).await, LoadOutcome::Applied);
        h.catalog
            .set_next_error(CatalogError::ApiError {
                status: 500,
                message: "internal".to_string(),
            })
            .await;
        assert_eq!(h.manager.search("bravo", 1).await, LoadOutcome::Failed);

        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.search.query, "alpha");
        assert!(snapshot
            .search
            .results
            .movies
            .iter()
            .all(|m| m.title.starts_with("alpha")));

        // The next page continues the query the results belong to
        h.catalog.clear_recorded().await;
        assert_eq!(h.manager.load_more().await, LoadOutcome::Applied);
        let queries = h.catalog.recorded_queries().await;
        assert!(matches!(
            &queries[..],
            [RecordedCatalogQuery::Search { query, page: 2 }] if query == "alpha"
        ));
        let titles: Vec<String> = h
            .manager
            .snapshot()
            .search
            .results
            .movies
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["alpha 1", "alpha 2", "alpha 3"]);
    }
}
