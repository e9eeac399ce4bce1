//! Catalog manager lifecycle integration tests.
//!
//! These tests drive the manager against the mock catalog and a SQLite
//! preference store on disk: browsing, searching, filtering, paging,
//! favorites across restarts and out-of-order responses.

use std::sync::Arc;

use tempfile::TempDir;

use reelscout_core::{
    manager::SearchState,
    store::{FAVORITES_KEY, LAST_SEARCH_KEY},
    testing::{fixtures, MockCatalog, RecordedCatalogQuery},
    CatalogError, CatalogManager, CollectionKind, FilterBuilder, FilterInput, KeyValueStore,
    LoadOutcome, Preferences, SqliteStore,
};

/// Test helper owning the mock catalog and the store directory.
struct TestHarness {
    catalog: Arc<MockCatalog>,
    temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_page_size(2).await;

        Self { catalog, temp_dir }
    }

    fn store(&self) -> Arc<SqliteStore> {
        let path = self.temp_dir.path().join("prefs.db");
        Arc::new(SqliteStore::new(&path).expect("Failed to open store"))
    }

    /// A manager over a freshly opened store, as after an app restart.
    fn manager(&self) -> Arc<CatalogManager> {
        Arc::new(CatalogManager::with_filter_builder(
            self.catalog.clone(),
            Preferences::new(self.store()),
            FilterBuilder::with_current_year(2024),
        ))
    }
}

#[tokio::test]
async fn test_filter_pagination_stops_at_last_page() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(fixtures::movies(1..=6, "Action", 28))
        .await;
    let manager = harness.manager();

    assert_eq!(
        manager.apply_filter(FilterInput::with_genres([28])).await,
        LoadOutcome::Applied
    );
    assert_eq!(manager.snapshot().filtered.results.total_pages, 3);

    assert_eq!(manager.load_more_filtered().await, LoadOutcome::Applied);
    assert_eq!(manager.load_more_filtered().await, LoadOutcome::Applied);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.filtered.results.page, 3);
    assert_eq!(snapshot.filtered.results.movies.len(), 6);
    assert!(!snapshot.display.has_more);

    let before = harness.catalog.query_count().await;
    assert_eq!(manager.load_more_filtered().await, LoadOutcome::Skipped);
    assert_eq!(harness.catalog.query_count().await, before);

    let pages: Vec<u32> = harness
        .catalog
        .recorded_queries()
        .await
        .into_iter()
        .filter_map(|q| match q {
            RecordedCatalogQuery::Discover { query } => Some(query.page),
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_display_precedence() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(vec![
            fixtures::movie_with_genres(1, "Heat", 1995, &[28]),
            fixtures::movie_with_genres(2, "Alien", 1979, &[878]),
        ])
        .await;
    let manager = harness.manager();

    manager.load_trending_page(1).await;
    assert_eq!(manager.display().source, CollectionKind::Trending);
    assert_eq!(manager.display().title, "Trending Movies");

    manager.apply_filter(FilterInput::with_genres([28])).await;
    assert_eq!(manager.display().source, CollectionKind::Filter);

    manager.search("alien", 1).await;
    let display = manager.display();
    assert_eq!(display.source, CollectionKind::Search);
    assert_eq!(display.title, "Search Results for \"alien\"");
    assert_eq!(display.movies.len(), 1);

    manager.clear_search();
    assert_eq!(manager.display().source, CollectionKind::Filter);

    assert_eq!(
        manager.apply_filter(FilterInput::default()).await,
        LoadOutcome::FilterCleared
    );
    let display = manager.display();
    assert_eq!(display.source, CollectionKind::Trending);
    assert_eq!(display.movies.len(), 2);
}

#[tokio::test]
async fn test_load_more_follows_displayed_collection() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(fixtures::movies(1..=5, "Movie", 28))
        .await;
    let manager = harness.manager();

    manager.load_trending_page(1).await;
    manager.search("movie", 1).await;
    harness.catalog.clear_recorded().await;

    assert_eq!(manager.load_more().await, LoadOutcome::Applied);

    let queries = harness.catalog.recorded_queries().await;
    assert_eq!(queries.len(), 1);
    assert!(matches!(
        &queries[0],
        RecordedCatalogQuery::Search { query, page: 2 } if query == "movie"
    ));
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.search.results.movies.len(), 4);
    assert_eq!(snapshot.trending.movies.len(), 2);
}

#[tokio::test]
async fn test_failed_append_keeps_prior_pages() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(fixtures::movies(1..=6, "Action", 28))
        .await;
    let manager = harness.manager();

    manager.apply_filter(FilterInput::with_genres([28])).await;
    harness
        .catalog
        .set_next_error(CatalogError::ApiError {
            status: 503,
            message: "unavailable".to_string(),
        })
        .await;

    assert_eq!(manager.load_more_filtered().await, LoadOutcome::Failed);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.filtered.results.movies.len(), 2);
    assert_eq!(snapshot.filtered.results.page, 1);
    assert!(!snapshot.loading);
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Failed to load more movies. Please try again later.")
    );

    // The same page can be retried
    assert_eq!(manager.load_more_filtered().await, LoadOutcome::Applied);
    assert_eq!(manager.snapshot().filtered.results.page, 2);
    assert!(manager.error().is_none());
}

#[tokio::test]
async fn test_stale_search_response_discarded() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(vec![
            fixtures::movie(1, "a tale", 2001),
            fixtures::movie(2, "b movie", 2002),
        ])
        .await;
    let manager = harness.manager();
    let gate = harness.catalog.hold_search("a").await;

    let slow = tokio::spawn({
        let manager = manager.clone();
        async move { manager.search("a", 1).await }
    });

    // Wait until the slow request has reached the catalog
    while harness.catalog.query_count().await == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(manager.search("b", 1).await, LoadOutcome::Applied);
    gate.notify_one();
    assert_eq!(slow.await.unwrap(), LoadOutcome::Discarded);

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.search.query, "b");
    assert_eq!(snapshot.search.results.movies.len(), 1);
    assert_eq!(snapshot.search.results.movies[0].id, 2);
    assert_eq!(snapshot.last_search, "b");
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_stale_detail_discarded() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(vec![
            fixtures::movie(1, "First", 2001),
            fixtures::movie(2, "Second", 2002),
        ])
        .await;
    let manager = harness.manager();
    let gate = harness.catalog.hold_detail(1).await;

    let slow = tokio::spawn({
        let manager = manager.clone();
        async move { manager.load_detail(1).await }
    });
    while harness.catalog.query_count().await == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(manager.load_detail(2).await, LoadOutcome::Applied);
    gate.notify_one();
    assert_eq!(slow.await.unwrap(), LoadOutcome::Discarded);

    assert_eq!(manager.detail().unwrap().movie.id, 2);
}

#[tokio::test]
async fn test_new_filter_discards_pending_page() {
    let harness = TestHarness::new().await;
    let mut movies = fixtures::movies(1..=6, "Action", 28);
    movies.extend(fixtures::movies(7..=8, "Comedy", 35));
    harness.catalog.set_movies(movies).await;
    let manager = harness.manager();

    assert_eq!(
        manager.apply_filter(FilterInput::with_genres([28])).await,
        LoadOutcome::Applied
    );
    let gate = harness.catalog.hold_discover(2).await;
    let before = harness.catalog.query_count().await;

    let slow = tokio::spawn({
        let manager = manager.clone();
        async move { manager.load_more_filtered().await }
    });
    while harness.catalog.query_count().await == before {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        manager.apply_filter(FilterInput::with_genres([35])).await,
        LoadOutcome::Applied
    );
    gate.notify_one();
    assert_eq!(slow.await.unwrap(), LoadOutcome::Discarded);

    let snapshot = manager.snapshot();
    let filter = snapshot.filtered.filter.expect("filter should be active");
    assert_eq!(filter.genre_list(), "35");
    let ids: Vec<u32> = snapshot.filtered.results.movies.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![7, 8]);
    assert_eq!(snapshot.filtered.results.page, 1);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_cleared_filter_discards_pending_discover() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(fixtures::movies(1..=4, "Action", 28))
        .await;
    let manager = harness.manager();
    let gate = harness.catalog.hold_discover(1).await;

    let slow = tokio::spawn({
        let manager = manager.clone();
        async move { manager.apply_filter(FilterInput::with_genres([28])).await }
    });
    while harness.catalog.query_count().await == 0 {
        tokio::task::yield_now().await;
    }

    assert_eq!(
        manager.apply_filter(FilterInput::default()).await,
        LoadOutcome::FilterCleared
    );
    gate.notify_one();
    assert_eq!(slow.await.unwrap(), LoadOutcome::Discarded);

    let snapshot = manager.snapshot();
    assert!(snapshot.filtered.filter.is_none());
    assert!(snapshot.filtered.results.movies.is_empty());
    assert_eq!(snapshot.display.source, CollectionKind::Trending);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_favorites_survive_restart() {
    let harness = TestHarness::new().await;

    {
        let manager = harness.manager();
        manager.toggle_favorite(&fixtures::movie(3, "Heat", 1995));
        manager.toggle_favorite(&fixtures::movie(1, "Alien", 1979));
        manager.toggle_favorite(&fixtures::movie(2, "Ran", 1985));
        manager.toggle_favorite(&fixtures::movie(1, "Alien", 1979));
    }

    let manager = harness.manager();
    let ids: Vec<u32> = manager.favorites().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 2]);
    assert!(manager.is_favorite(2));
    assert!(!manager.is_favorite(1));
}

#[tokio::test]
async fn test_last_search_survives_restart() {
    let harness = TestHarness::new().await;
    harness
        .catalog
        .set_movies(vec![fixtures::movie(1, "Dune", 2021)])
        .await;

    harness.manager().search("dune", 1).await;

    let manager = harness.manager();
    let snapshot = manager.snapshot();
    assert_eq!(snapshot.last_search, "dune");
    assert_eq!(snapshot.search, SearchState::default());

    assert_eq!(manager.restore_last_search().await, LoadOutcome::Applied);
    assert_eq!(manager.display().movies.len(), 1);

    manager.clear_search();
    assert_eq!(harness.store().get(LAST_SEARCH_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_corrupt_favorites_start_empty() {
    let harness = TestHarness::new().await;
    harness
        .store()
        .set(FAVORITES_KEY, "[{\"id\": \"not a number\"}]")
        .unwrap();

    let manager = harness.manager();
    assert!(manager.favorites().is_empty());

    // The next toggle overwrites the corrupt value
    manager.toggle_favorite(&fixtures::movie(7, "Se7en", 1995));
    assert_eq!(harness.manager().favorites().len(), 1);
}
