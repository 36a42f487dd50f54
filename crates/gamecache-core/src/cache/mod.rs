//! Local caching module for offline catalog access.
//!
//! This module provides the `CatalogCache`, which owns the in-memory games,
//! categories and favorites and keeps them consistent with the remote
//! catalog and with a persistent key-value store.
//!
//! Stored keys (each a JSON array):
//! - `games`
//! - `categories`
//! - `favorites` (denormalized game copies, local only)

pub mod filter;
pub mod manager;
pub mod store;

pub use filter::{GameFilter, ALL_CATEGORIES};
pub use manager::{CatalogCache, CatalogEvent, Collection, LoadSource, PopulateReport};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
