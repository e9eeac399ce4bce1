//! Testing utilities and mock implementations.
//!
//! This module provides a mock movie catalog and an in-memory preference
//! store, allowing the catalog manager to be exercised without network or
//! disk access.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelscout_core::testing::{fixtures, MemoryStore, MockCatalog};
//!
//! let catalog = Arc::new(MockCatalog::new());
//! let store = Arc::new(MemoryStore::new());
//!
//! // Configure mock responses
//! catalog.set_movies(fixtures::movies(1..=40, "Movie", 28)).await;
//!
//! let manager = CatalogManager::new(catalog, Preferences::new(store));
//! ```

mod memory_store;
mod mock_catalog;

pub use memory_store::MemoryStore;
pub use mock_catalog::{MockCatalog, RecordedCatalogQuery};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::ops::RangeInclusive;

    use chrono::NaiveDate;

    use crate::catalog::{CastMember, Genre, Movie, MovieDetail, Video};

    /// Create a test movie released on January 1st of `year`.
    pub fn movie(id: u32, title: &str, year: i32) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            overview: format!("Overview of {}", title),
            release_date: NaiveDate::from_ymd_opt(year, 1, 1),
            poster_path: Some(format!("/poster-{}.jpg", id)),
            backdrop_path: Some(format!("/backdrop-{}.jpg", id)),
            vote_average: 7.0,
            vote_count: 1000,
            genre_ids: Vec::new(),
        }
    }

    /// Create a test movie tagged with genres.
    pub fn movie_with_genres(id: u32, title: &str, year: i32, genres: &[u32]) -> Movie {
        Movie {
            genre_ids: genres.to_vec(),
            ..movie(id, title, year)
        }
    }

    /// Create numbered movies ("{prefix} {id}") from 2000 in one genre.
    pub fn movies(ids: RangeInclusive<u32>, prefix: &str, genre: u32) -> Vec<Movie> {
        ids.map(|id| movie_with_genres(id, &format!("{} {}", prefix, id), 2000, &[genre]))
            .collect()
    }

    /// A small slice of the TMDB movie genre list.
    pub fn genres() -> Vec<Genre> {
        [(28, "Action"), (35, "Comedy"), (18, "Drama"), (878, "Science Fiction")]
            .into_iter()
            .map(|(id, name)| Genre {
                id,
                name: name.to_string(),
            })
            .collect()
    }

    /// Create a detail record with a YouTube trailer and two cast members.
    pub fn movie_detail(movie: Movie) -> MovieDetail {
        let key = format!("trailer{}", movie.id);
        MovieDetail {
            runtime_minutes: Some(120),
            tagline: Some(format!("The story of {}", movie.title)),
            genres: vec![Genre {
                id: 28,
                name: "Action".to_string(),
            }],
            videos: vec![Video {
                name: "Official Trailer".to_string(),
                site: "YouTube".to_string(),
                kind: "Trailer".to_string(),
                key,
            }],
            cast: vec![
                CastMember {
                    id: 2,
                    name: "Second Lead".to_string(),
                    character: "Sidekick".to_string(),
                    profile_path: None,
                    order: 1,
                },
                CastMember {
                    id: 1,
                    name: "Lead Actor".to_string(),
                    character: "Hero".to_string(),
                    profile_path: Some("/lead.jpg".to_string()),
                    order: 0,
                },
            ],
            movie,
        }
    }
}
