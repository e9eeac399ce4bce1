//! Filter types shared by the builder, the catalog client and the manager.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Earliest release year offered by the year filter.
pub const MIN_YEAR: i32 = 1900;
/// Upper bound of the rating scale.
pub const MAX_RATING: f32 = 10.0;

/// Sort order for discovery queries.
///
/// The serialized form is the exact `sort_by` token the catalog API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
    #[serde(rename = "vote_average.asc")]
    VoteAverageAsc,
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
    #[serde(rename = "release_date.asc")]
    ReleaseDateAsc,
}

impl SortKey {
    /// Every recognized sort key, in menu order.
    pub const ALL: [SortKey; 6] = [
        SortKey::PopularityDesc,
        SortKey::PopularityAsc,
        SortKey::VoteAverageDesc,
        SortKey::VoteAverageAsc,
        SortKey::ReleaseDateDesc,
        SortKey::ReleaseDateAsc,
    ];

    /// The `sort_by` token.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::PopularityDesc => "popularity.desc",
            SortKey::PopularityAsc => "popularity.asc",
            SortKey::VoteAverageDesc => "vote_average.desc",
            SortKey::VoteAverageAsc => "vote_average.asc",
            SortKey::ReleaseDateDesc => "release_date.desc",
            SortKey::ReleaseDateAsc => "release_date.asc",
        }
    }

    /// Human-readable menu label.
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::PopularityDesc => "Popularity (High to Low)",
            SortKey::PopularityAsc => "Popularity (Low to High)",
            SortKey::VoteAverageDesc => "Rating (High to Low)",
            SortKey::VoteAverageAsc => "Rating (Low to High)",
            SortKey::ReleaseDateDesc => "Newest Releases",
            SortKey::ReleaseDateAsc => "Oldest Releases",
        }
    }

    /// Parse an exact `sort_by` token.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == token)
    }

    /// Parse a token, falling back to popularity descending when unrecognized.
    pub fn parse_or_default(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive release year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// First day of the range, as a catalog date bound.
    pub fn date_gte(&self) -> String {
        format!("{}-01-01", self.min)
    }

    /// Last day of the range, as a catalog date bound.
    pub fn date_lte(&self) -> String {
        format!("{}-12-31", self.max)
    }
}

/// Inclusive average-vote range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRange {
    pub min: f32,
    pub max: f32,
}

impl Default for RatingRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: MAX_RATING,
        }
    }
}

/// Raw, unvalidated filter selection from the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterInput {
    /// Selected genre IDs (duplicates allowed).
    #[serde(default)]
    pub genres: Vec<u32>,
    /// Year bounds as chosen, possibly out of order.
    #[serde(default)]
    pub years: Option<(i32, i32)>,
    /// Rating bounds as chosen, possibly out of order or out of scale.
    #[serde(default)]
    pub rating: Option<(f32, f32)>,
    /// Sort token as chosen.
    #[serde(default)]
    pub sort_by: Option<String>,
}

impl FilterInput {
    /// Create an input selecting the given genres and nothing else.
    pub fn with_genres(genres: impl IntoIterator<Item = u32>) -> Self {
        Self {
            genres: genres.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Set the year bounds.
    pub fn years(mut self, from: i32, to: i32) -> Self {
        self.years = Some((from, to));
        self
    }

    /// Set the rating bounds.
    pub fn rating(mut self, from: f32, to: f32) -> Self {
        self.rating = Some((from, to));
        self
    }

    /// Set the sort token.
    pub fn sort_by(mut self, token: impl Into<String>) -> Self {
        self.sort_by = Some(token.into());
        self
    }
}

/// A validated filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Selected genres; empty means no active filter.
    pub genres: BTreeSet<u32>,
    pub years: YearRange,
    pub rating: RatingRange,
    pub sort: SortKey,
}

impl FilterState {
    /// Whether this selection constrains anything.
    pub fn is_active(&self) -> bool {
        !self.genres.is_empty()
    }

    /// Comma-joined genre IDs in ascending order.
    pub fn genre_list(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// One page of a discovery query.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub filter: FilterState,
    pub page: u32,
}

impl DiscoverQuery {
    pub fn new(filter: FilterState, page: u32) -> Self {
        Self {
            filter,
            page: page.max(1),
        }
    }

    /// The exact query parameters of a `/discover/movie` request.
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("with_genres", self.filter.genre_list()),
            ("sort_by", self.filter.sort.as_str().to_string()),
            ("primary_release_date.gte", self.filter.years.date_gte()),
            ("primary_release_date.lte", self.filter.years.date_lte()),
            ("vote_average.gte", self.filter.rating.min.to_string()),
            ("vote_average.lte", self.filter.rating.max.to_string()),
            ("page", self.page.to_string()),
        ]
    }
}
