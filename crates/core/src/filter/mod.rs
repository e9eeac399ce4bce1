//! Filter builder for discovery queries.
//!
//! Turns the raw selection made in the filter bar into a well-formed
//! [`FilterState`]: ranges are defaulted and reordered, ratings are clamped
//! to the scale and unknown sort tokens fall back to popularity.

mod types;

pub use types::*;

use chrono::{Datelike, Local};

/// Validates and defaults raw filter input.
#[derive(Debug, Clone, Copy)]
pub struct FilterBuilder {
    current_year: i32,
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterBuilder {
    /// Create a builder whose year default ends at the current local year.
    pub fn new() -> Self {
        Self::with_current_year(Local::now().year())
    }

    /// Create a builder with a fixed "current year".
    pub fn with_current_year(current_year: i32) -> Self {
        Self { current_year }
    }

    /// The year range used when none is selected.
    pub fn default_years(&self) -> YearRange {
        YearRange {
            min: MIN_YEAR,
            max: self.current_year,
        }
    }

    /// The selection produced by the "Reset Filters" action.
    pub fn reset(&self) -> FilterState {
        self.build(FilterInput::default())
    }

    /// Build a validated filter from raw input.
    pub fn build(&self, input: FilterInput) -> FilterState {
        let years = match input.years {
            Some((a, b)) if a <= b => YearRange { min: a, max: b },
            Some((a, b)) => YearRange { min: b, max: a },
            None => self.default_years(),
        };

        let rating = match input.rating {
            Some((a, b)) => {
                let (a, b) = (clamp_rating(a), clamp_rating(b));
                if a <= b {
                    RatingRange { min: a, max: b }
                } else {
                    RatingRange { min: b, max: a }
                }
            }
            None => RatingRange::default(),
        };

        let sort = input
            .sort_by
            .as_deref()
            .map(SortKey::parse_or_default)
            .unwrap_or_default();

        FilterState {
            genres: input.genres.into_iter().collect(),
            years,
            rating,
            sort,
        }
    }
}

fn clamp_rating(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_RATING)
    }
}
