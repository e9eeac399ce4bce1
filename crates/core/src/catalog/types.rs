//! Domain types for movie catalog responses.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Poster size used for cards and the detail page.
pub const POSTER_SIZE: &str = "w500";
/// Headshot size used for cast members.
pub const PROFILE_SIZE: &str = "w200";
/// Backdrop size used for hero images.
pub const BACKDROP_SIZE: &str = "original";

// ============================================================================
// Listing Types
// ============================================================================

/// A movie as returned by listing endpoints.
///
/// Favorites are persisted as full records of this type, so its serialized
/// form is also the on-disk format of the favorites slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Catalog movie ID.
    pub id: u32,
    /// Movie title.
    pub title: String,
    /// Synopsis (may be empty).
    #[serde(default)]
    pub overview: String,
    /// Primary release date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    /// Poster path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Backdrop path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    /// Average vote (0-10).
    #[serde(default)]
    pub vote_average: f32,
    /// Number of votes.
    #[serde(default)]
    pub vote_count: u32,
    /// Genre IDs.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
}

impl Movie {
    /// Get the release year from the release date.
    pub fn year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }

    /// Full poster URL for the given image base and size.
    pub fn poster_url(&self, image_base_url: &str, size: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|p| image_url(image_base_url, size, p))
    }

    /// Full backdrop URL for the given image base and size.
    pub fn backdrop_url(&self, image_base_url: &str, size: &str) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .map(|p| image_url(image_base_url, size, p))
    }
}

/// Join an image base URL, a size token and a relative path.
pub fn image_url(image_base_url: &str, size: &str, path: &str) -> String {
    format!("{}/{}{}", image_base_url.trim_end_matches('/'), size, path)
}

/// A movie genre.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoviePage {
    /// Movies on this page, in catalog order.
    pub results: Vec<Movie>,
    /// Page number (1-indexed).
    pub page: u32,
    /// Total pages available (always at least 1).
    pub total_pages: u32,
    /// Total results across all pages.
    #[serde(default)]
    pub total_results: u32,
}

impl MoviePage {
    /// Build a page, normalizing the page counters to be at least 1.
    pub fn new(results: Vec<Movie>, page: u32, total_pages: u32) -> Self {
        let total_results = results.len() as u32;
        Self {
            results,
            page: page.max(1),
            total_pages: total_pages.max(1),
            total_results,
        }
    }
}

// ============================================================================
// Detail Types
// ============================================================================

/// Full movie details with trailers and cast.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    /// Listing-level fields.
    pub movie: Movie,
    /// Runtime in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// Tagline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    /// Resolved genres.
    #[serde(default)]
    pub genres: Vec<Genre>,
    /// Attached videos (trailers, teasers, clips).
    #[serde(default)]
    pub videos: Vec<Video>,
    /// Cast in billing order.
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

impl MovieDetail {
    /// The first YouTube trailer, if any.
    pub fn trailer(&self) -> Option<&Video> {
        self.videos
            .iter()
            .find(|v| v.kind == "Trailer" && v.site == "YouTube")
    }

    /// The top `n` cast members by billing order.
    pub fn top_cast(&self, n: usize) -> Vec<&CastMember> {
        let mut cast: Vec<&CastMember> = self.cast.iter().collect();
        cast.sort_by_key(|c| c.order);
        cast.truncate(n);
        cast
    }
}

/// A video attached to a movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    /// Site-specific video key.
    pub key: String,
    pub name: String,
    /// Hosting site ("YouTube", "Vimeo").
    pub site: String,
    /// Video type ("Trailer", "Teaser", "Clip", ...).
    pub kind: String,
}

impl Video {
    /// Watch URL, for YouTube videos.
    pub fn youtube_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }

    /// Autoplaying embed URL, for YouTube videos.
    pub fn youtube_embed_url(&self) -> Option<String> {
        (self.site == "YouTube")
            .then(|| format!("https://www.youtube.com/embed/{}?autoplay=1", self.key))
    }
}

/// A credited cast member.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u32,
    pub name: String,
    /// Character played (may be empty).
    #[serde(default)]
    pub character: String,
    /// Headshot path (relative to the image base URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_path: Option<String>,
    /// Billing order (0 = top billed).
    #[serde(default)]
    pub order: u32,
}

impl CastMember {
    /// Full headshot URL for the given image base.
    pub fn profile_url(&self, image_base_url: &str) -> Option<String> {
        self.profile_path
            .as_deref()
            .map(|p| image_url(image_base_url, PROFILE_SIZE, p))
    }
}
