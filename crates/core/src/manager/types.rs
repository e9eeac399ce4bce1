//! State containers owned by the catalog manager.

use serde::Serialize;

use crate::catalog::{Genre, Movie, MovieDetail, MoviePage};
use crate::filter::FilterState;

/// A paginated movie listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionState {
    /// Movies in page-arrival order. Not deduplicated across pages.
    pub movies: Vec<Movie>,
    /// Last page merged (1-indexed).
    pub page: u32,
    /// Total pages reported by the catalog (at least 1).
    pub total_pages: u32,
}

impl Default for CollectionState {
    fn default() -> Self {
        Self {
            movies: Vec::new(),
            page: 1,
            total_pages: 1,
        }
    }
}

impl CollectionState {
    /// Whether another page can be requested.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    /// The page cursor for a "load more".
    pub fn next_page(&self) -> u32 {
        self.page + 1
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Replace the whole listing with a fresh first page.
    pub fn replace(&mut self, page: MoviePage) {
        self.movies = page.results;
        self.page = page.page.max(1);
        self.total_pages = page.total_pages.max(1);
    }

    /// Append a further page.
    pub fn append(&mut self, page: MoviePage) {
        self.movies.extend(page.results);
        self.page = page.page.max(1);
        self.total_pages = page.total_pages.max(1);
    }

    /// Merge a page: page 1 replaces, later pages append.
    pub fn merge(&mut self, page: MoviePage) {
        if page.page <= 1 {
            self.replace(page);
        } else {
            self.append(page);
        }
    }
}

/// Text search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    /// Active query; empty when no search is active.
    pub query: String,
    pub results: CollectionState,
}

impl SearchState {
    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

/// Results of the last applied filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredState {
    /// The applied filter, `None` when filtering is off.
    pub filter: Option<FilterState>,
    pub results: CollectionState,
}

impl FilteredState {
    pub fn is_active(&self) -> bool {
        self.filter.as_ref().is_some_and(|f| f.is_active())
    }
}

/// Bookmarked movies, unique by id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FavoritesSet {
    movies: Vec<Movie>,
}

impl FavoritesSet {
    /// Build from a persisted list, dropping repeated ids.
    pub fn from_movies(movies: Vec<Movie>) -> Self {
        let mut set = Self::default();
        for movie in movies {
            if !set.contains(movie.id) {
                set.movies.push(movie);
            }
        }
        set
    }

    pub fn contains(&self, movie_id: u32) -> bool {
        self.movies.iter().any(|m| m.id == movie_id)
    }

    /// Add the movie if absent, remove it if present.
    ///
    /// Returns `true` if the movie is a favorite afterwards.
    pub fn toggle(&mut self, movie: &Movie) -> bool {
        if self.contains(movie.id) {
            self.movies.retain(|m| m.id != movie.id);
            false
        } else {
            self.movies.push(movie.clone());
            true
        }
    }

    pub fn as_slice(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

/// Which collection the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Search,
    Filter,
    Trending,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Search => "search",
            CollectionKind::Filter => "filter",
            CollectionKind::Trending => "trending",
        }
    }
}

/// The collection to render, resolved by precedence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplaySelection {
    pub source: CollectionKind,
    /// Heading for the grid.
    pub title: String,
    pub movies: Vec<Movie>,
    pub has_more: bool,
}

/// Result of a manager operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was merged into state.
    Applied,
    /// Nothing to do; no request was sent.
    Skipped,
    /// A newer request superseded this one; the response was dropped.
    Discarded,
    /// The request failed; the error message was set and prior state kept.
    Failed,
    /// The filter had no genres; filtering is off and trending applies.
    FilterCleared,
}

/// Point-in-time copy of all manager state for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub trending: CollectionState,
    pub search: SearchState,
    pub filtered: FilteredState,
    pub favorites: Vec<Movie>,
    pub genres: Vec<Genre>,
    pub detail: Option<MovieDetail>,
    /// Persisted last search text, for pre-filling the search box.
    pub last_search: String,
    pub loading: bool,
    pub error: Option<String>,
    pub display: DisplaySelection,
}
