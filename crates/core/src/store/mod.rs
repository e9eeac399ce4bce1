//! Durable key-value storage for user preferences.
//!
//! Two slots survive restarts: the last search text and the favorites list.
//! Reads are best-effort: a missing, unreadable or corrupt slot yields its
//! empty default so that startup is never blocked by bad local data.

mod sqlite;

pub use sqlite::SqliteStore;

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::catalog::Movie;

/// Key of the last-search slot.
pub const LAST_SEARCH_KEY: &str = "lastSearch";
/// Key of the favorites slot.
pub const FAVORITES_KEY: &str = "favorites";

/// Errors from the preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for durable key-value backends.
///
/// Writes are synchronous: when `set` returns `Ok`, a subsequent `get`
/// observes the new value.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed access to the persisted preference slots.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the last search text (empty if unset or unreadable).
    pub fn load_last_search(&self) -> String {
        match self.store.get(LAST_SEARCH_KEY) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read last search, using empty: {}", e);
                String::new()
            }
        }
    }

    /// Persist the last search text. An empty text clears the slot.
    pub fn save_last_search(&self, query: &str) -> Result<(), StoreError> {
        if query.is_empty() {
            self.store.remove(LAST_SEARCH_KEY)
        } else {
            self.store.set(LAST_SEARCH_KEY, query)
        }
    }

    /// Clear the last search text.
    pub fn clear_last_search(&self) -> Result<(), StoreError> {
        self.store.remove(LAST_SEARCH_KEY)
    }

    /// Load the favorites list (empty if unset, unreadable or corrupt).
    pub fn load_favorites(&self) -> Vec<Movie> {
        let raw = match self.store.get(FAVORITES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read favorites, using empty list: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(favorites) => favorites,
            Err(e) => {
                warn!("Stored favorites are corrupt, using empty list: {}", e);
                Vec::new()
            }
        }
    }

    /// Persist the favorites list, preserving order.
    pub fn save_favorites(&self, favorites: &[Movie]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(favorites)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.set(FAVORITES_KEY, &raw)
    }
}
