pub mod catalog;
pub mod config;
pub mod filter;
pub mod manager;
pub mod metrics;
pub mod store;
pub mod testing;

pub use catalog::{
    CatalogError, CastMember, Genre, Movie, MovieCatalog, MovieDetail, MoviePage, TmdbClient,
    TmdbConfig, Video,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    StorageConfig,
};
pub use filter::{DiscoverQuery, FilterBuilder, FilterInput, FilterState, SortKey};
pub use manager::{
    CatalogManager, CatalogSnapshot, CollectionKind, CollectionState, DisplaySelection,
    LoadOutcome,
};
pub use store::{KeyValueStore, Preferences, SqliteStore, StoreError};
