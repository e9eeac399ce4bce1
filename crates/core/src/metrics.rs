//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog requests (by operation and result)
//! - Stale responses discarded by the state manager
//! - Favorite toggles

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts};

// =============================================================================
// Catalog Client
// =============================================================================

/// Catalog requests total by operation and result.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelscout_catalog_requests_total",
            "Total requests sent to the movie catalog",
        ),
        &["operation", "result"], // "trending", "search", ... / "success", "http", "api", ...
    )
    .unwrap()
});

// =============================================================================
// State Manager
// =============================================================================

/// Responses discarded because a newer request superseded them.
pub static STALE_RESPONSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelscout_stale_responses_total",
            "Catalog responses discarded as stale",
        ),
        &["collection"], // "trending", "search", "filter", "detail"
    )
    .unwrap()
});

/// Favorite toggles by resulting action.
pub static FAVORITE_TOGGLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "reelscout_favorite_toggles_total",
            "Total favorite toggles",
        ),
        &["action"], // "added", "removed"
    )
    .unwrap()
});

/// Failed writes to the persistent store.
pub static STORE_WRITE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "reelscout_store_write_failures_total",
        "Total failed writes to the preference store",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(STALE_RESPONSES.clone()),
        Box::new(FAVORITE_TOGGLES.clone()),
        Box::new(STORE_WRITE_FAILURES.clone()),
    ]
}
