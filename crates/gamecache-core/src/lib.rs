//! gamecache core - catalog API client, offline cache and favorites.
//!
//! The center of the crate is [`CatalogCache`]: it loads games and
//! categories cache-first, applies add/update/delete through the remote
//! catalog before touching local state, and keeps the favorites consistent
//! with the games (deleting a game removes its favorite).
//!
//! The remote catalog and the persistent store are traits
//! ([`CatalogService`], [`KeyValueStore`]) so front ends and tests can
//! supply their own.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, CatalogService};
pub use cache::{
    CatalogCache, CatalogEvent, Collection, FileStore, GameFilter, KeyValueStore, LoadSource,
    MemoryStore, PopulateReport, StoreError, ALL_CATEGORIES,
};
pub use config::Config;
pub use error::CatalogError;
pub use models::{Category, Game, GameDraft, NewGame, ValidationError};
