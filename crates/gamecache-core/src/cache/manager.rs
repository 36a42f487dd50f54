//! The catalog cache manager.
//!
//! `CatalogCache` holds the authoritative in-memory games, categories and
//! favorites. Loads are cache-first; mutations go to the remote catalog
//! first and only touch local state once the remote call succeeded.
//!
//! Each collection is persisted by rewriting its whole key. Writes to
//! different keys are not atomic together: a crash between the `games` and
//! `favorites` writes of a delete can leave a favorite whose game is gone
//! from the stored `games`. Nothing detects or repairs that.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tracing::{debug, error, info, warn};

use super::filter::{self, GameFilter};
use super::store::{
    FileStore, KeyValueStore, StoreError, CATEGORIES_KEY, FAVORITES_KEY, GAMES_KEY,
};
use crate::api::{ApiClient, CatalogService};
use crate::config::Config;
use crate::error::CatalogError;
use crate::models::{Category, Game, NewGame, ValidationError};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the change notification channel.
/// Subscribers that fall further behind than this see a `Lagged` error and
/// should re-read the collections.
const EVENT_CHANNEL_CAPACITY: usize = 32;

// ============================================================================
// Types
// ============================================================================

/// One of the three persisted collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Games,
    Categories,
    Favorites,
}

impl Collection {
    /// Store key holding this collection
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Games => GAMES_KEY,
            Collection::Categories => CATEGORIES_KEY,
            Collection::Favorites => FAVORITES_KEY,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where `populate` found the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Remote,
}

/// Change notifications for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEvent {
    Loaded { source: LoadSource },
    GamesChanged,
    FavoritesChanged,
    FetchFailed { collection: Collection, message: String },
    PersistFailed { collection: Collection, message: String },
}

/// Outcome of `populate` / `refresh`.
///
/// Loading never aborts on the first problem; every failure is collected
/// here and the affected collection keeps whatever it held before.
#[derive(Debug)]
pub struct PopulateReport {
    pub source: LoadSource,
    pub failures: Vec<CatalogError>,
}

impl PopulateReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    games: Vec<Game>,
    categories: Vec<Category>,
    favorites: Vec<Game>,
}

pub struct CatalogCache {
    service: Arc<dyn CatalogService>,
    store: Arc<dyn KeyValueStore>,
    state: RwLock<CatalogState>,
    /// Serializes update/delete calls for the same game id
    entity_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    games_write: AsyncMutex<()>,
    categories_write: AsyncMutex<()>,
    favorites_write: AsyncMutex<()>,
    events: broadcast::Sender<CatalogEvent>,
}

impl CatalogCache {
    pub fn new(service: Arc<dyn CatalogService>, store: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            service,
            store,
            state: RwLock::new(CatalogState::default()),
            entity_locks: Mutex::new(HashMap::new()),
            games_write: AsyncMutex::new(()),
            categories_write: AsyncMutex::new(()),
            favorites_write: AsyncMutex::new(()),
            events,
        }
    }

    /// Build a cache backed by the HTTP catalog and a file store in the configured cache dir
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api = ApiClient::from_config(config)?;
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, base_url = api.base_url(), "Catalog cache configured");
        Ok(Self::new(Arc::new(api), Arc::new(FileStore::new(cache_dir))))
    }

    /// Receive change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Load the catalog, preferring the local store.
    ///
    /// Stored `games` and `categories` that are both present and non-empty
    /// are used as-is and the remote catalog is not contacted. Otherwise both
    /// are fetched from the remote catalog and written back. The `favorites`
    /// key is always loaded, and initialized to an empty array when absent.
    pub async fn populate(&self) -> PopulateReport {
        let mut failures = Vec::new();

        self.load_favorites(&mut failures).await;

        let games = self.read_or_report::<Game>(Collection::Games, &mut failures).await;
        let categories = self
            .read_or_report::<Category>(Collection::Categories, &mut failures)
            .await;

        let source = match (games, categories) {
            (Some(games), Some(categories)) if !games.is_empty() && !categories.is_empty() => {
                debug!(
                    games = games.len(),
                    categories = categories.len(),
                    "Catalog loaded from cache"
                );
                self.replace_catalog(games, categories);
                LoadSource::Cache
            }
            _ => {
                debug!("Catalog cache miss, fetching from remote");
                self.fetch_remote(&mut failures).await;
                LoadSource::Remote
            }
        };

        self.emit(CatalogEvent::Loaded { source });
        PopulateReport { source, failures }
    }

    /// Re-fetch games and categories from the remote catalog regardless of the cache
    pub async fn refresh(&self) -> PopulateReport {
        let mut failures = Vec::new();
        self.fetch_remote(&mut failures).await;
        self.emit(CatalogEvent::Loaded {
            source: LoadSource::Remote,
        });
        PopulateReport {
            source: LoadSource::Remote,
            failures,
        }
    }

    async fn load_favorites(&self, failures: &mut Vec<CatalogError>) {
        match self.read_stored::<Game>(Collection::Favorites).await {
            Ok(Some(favorites)) => {
                debug!(count = favorites.len(), "Favorites loaded");
                self.write_state().favorites = favorites;
            }
            Ok(None) => {
                debug!("No stored favorites, initializing");
                self.write_state().favorites = Vec::new();
                if let Some(e) = self.persist_or_report(Collection::Favorites).await {
                    failures.push(e.into());
                }
            }
            Err(StoreError::Serialization(e)) => {
                warn!(error = %e, "Stored favorites are unreadable, resetting");
                self.write_state().favorites = Vec::new();
                failures.push(StoreError::Serialization(e).into());
                if let Some(e) = self.persist_or_report(Collection::Favorites).await {
                    failures.push(e.into());
                }
            }
            Err(e) => {
                // Leave the stored value alone; it may still be intact
                warn!(error = %e, "Failed to read favorites");
                failures.push(e.into());
            }
        }
    }

    async fn fetch_remote(&self, failures: &mut Vec<CatalogError>) {
        match self.service.list_games().await {
            Ok(games) => {
                info!(count = games.len(), "Fetched games");
                self.write_state().games = games;
                if let Some(e) = self.persist_or_report(Collection::Games).await {
                    failures.push(e.into());
                }
                self.emit(CatalogEvent::GamesChanged);
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch games");
                self.emit(CatalogEvent::FetchFailed {
                    collection: Collection::Games,
                    message: e.to_string(),
                });
                failures.push(e.into());
            }
        }

        match self.service.list_categories().await {
            Ok(categories) => {
                info!(count = categories.len(), "Fetched categories");
                self.write_state().categories = categories;
                if let Some(e) = self.persist_or_report(Collection::Categories).await {
                    failures.push(e.into());
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch categories");
                self.emit(CatalogEvent::FetchFailed {
                    collection: Collection::Categories,
                    message: e.to_string(),
                });
                failures.push(e.into());
            }
        }
    }

    // =========================================================================
    // Read access and derived views
    // =========================================================================

    pub fn games(&self) -> Vec<Game> {
        self.read_state().games.clone()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.read_state().categories.clone()
    }

    pub fn favorites(&self) -> Vec<Game> {
        self.read_state().favorites.clone()
    }

    pub fn favorite_ids(&self) -> HashSet<String> {
        self.read_state()
            .favorites
            .iter()
            .map(|f| f.id.clone())
            .collect()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.read_state().favorites.iter().any(|f| f.id == id)
    }

    /// Look up a game by id
    pub fn game(&self, id: &str) -> Option<Game> {
        self.read_state().games.iter().find(|g| g.id == id).cloned()
    }

    /// Games in `category`, or all games for `ALL_CATEGORIES`
    pub fn filter_by_category(&self, category: &str) -> Vec<Game> {
        filter::filter_by_category(&self.read_state().games, category)
    }

    /// Games whose title contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<Game> {
        filter::search(&self.read_state().games, query)
    }

    /// Games matching both the category and the title query of `filter`
    pub fn filtered(&self, filter: &GameFilter) -> Vec<Game> {
        filter.apply(&self.read_state().games)
    }

    // =========================================================================
    // Favorites
    // =========================================================================

    /// Add `game` to the favorites, or remove it if already there.
    ///
    /// Returns whether the game is a favorite afterwards. The in-memory
    /// toggle is kept even if persisting it fails; the store error is
    /// returned so the caller can report it.
    pub async fn toggle_favorite(&self, game: &Game) -> Result<bool, CatalogError> {
        let now_favorite = {
            let mut state = self.write_state();
            let before = state.favorites.len();
            state.favorites.retain(|f| f.id != game.id);
            if state.favorites.len() < before {
                false
            } else if state.games.iter().any(|g| g.id == game.id) {
                state.favorites.push(game.clone());
                true
            } else {
                return Err(CatalogError::UnknownGame(game.id.clone()));
            }
        };

        debug!(id = %game.id, favorite = now_favorite, "Favorite toggled");
        self.emit(CatalogEvent::FavoritesChanged);
        self.persist_favorites_strict().await?;
        Ok(now_favorite)
    }

    /// Remove the favorite with `id`. Returns whether one was removed.
    pub async fn remove_favorite(&self, id: &str) -> Result<bool, CatalogError> {
        let removed = {
            let mut state = self.write_state();
            let before = state.favorites.len();
            state.favorites.retain(|f| f.id != id);
            state.favorites.len() < before
        };

        if removed {
            self.emit(CatalogEvent::FavoritesChanged);
        }
        self.persist_favorites_strict().await?;
        Ok(removed)
    }

    async fn persist_favorites_strict(&self) -> Result<(), CatalogError> {
        if let Some(e) = self.persist_or_report(Collection::Favorites).await {
            return Err(e.into());
        }
        Ok(())
    }

    // =========================================================================
    // Game mutations
    // =========================================================================

    /// Validate the form, create the game remotely, then append the
    /// service's response (which carries the assigned id).
    pub async fn add_game(&self, candidate: &NewGame) -> Result<Game, CatalogError> {
        let draft = candidate.validate().map_err(|e| {
            debug!(error = %e, "Rejected new game");
            e
        })?;

        let created = self.service.create_game(&draft).await.map_err(|e| {
            error!(error = %e, title = %draft.title, "Failed to add game");
            e
        })?;

        self.write_state().games.push(created.clone());
        self.persist_or_report(Collection::Games).await;
        self.emit(CatalogEvent::GamesChanged);

        info!(id = %created.id, title = %created.title, "Game added");
        Ok(created)
    }

    /// Send `modified` to the remote catalog and store the service's response.
    ///
    /// The stored entry is whatever the service returned, which may differ
    /// from `modified` when the service normalizes fields. A favorite copy of
    /// the same game is refreshed too.
    ///
    /// A non-finite price is rejected before anything is sent: JSON has no
    /// NaN or infinity and the body would carry `null` instead.
    pub async fn update_game(&self, modified: &Game) -> Result<Game, CatalogError> {
        if !modified.price.is_finite() {
            debug!(id = %modified.id, price = %modified.price, "Rejected update with non-finite price");
            return Err(ValidationError::InvalidPrice(modified.price.to_string()).into());
        }

        let lease = self.lease_entity(&modified.id);
        let _guard = lease.lock.lock().await;
        self.update_game_locked(modified).await
    }

    async fn update_game_locked(&self, modified: &Game) -> Result<Game, CatalogError> {
        let updated = self.service.update_game(modified).await.map_err(|e| {
            error!(error = %e, id = %modified.id, "Failed to update game");
            e
        })?;

        let (found, favorite_refreshed) = {
            let mut state = self.write_state();
            let found = replace_by_id(&mut state.games, &modified.id, &updated);
            let favorite_refreshed = replace_by_id(&mut state.favorites, &modified.id, &updated);
            (found, favorite_refreshed)
        };

        if !found {
            debug!(id = %modified.id, "Updated game is not in the local collection");
        }

        self.persist_or_report(Collection::Games).await;
        self.emit(CatalogEvent::GamesChanged);
        if favorite_refreshed {
            self.persist_or_report(Collection::Favorites).await;
            self.emit(CatalogEvent::FavoritesChanged);
        }

        info!(id = %updated.id, title = %updated.title, "Game updated");
        Ok(updated)
    }

    /// Delete the game remotely, then drop it from the games and from the favorites.
    pub async fn delete_game(&self, id: &str) -> Result<(), CatalogError> {
        let lease = self.lease_entity(id);
        let _guard = lease.lock.lock().await;
        self.delete_game_locked(id).await
    }

    async fn delete_game_locked(&self, id: &str) -> Result<(), CatalogError> {
        self.service.delete_game(id).await.map_err(|e| {
            error!(error = %e, id = id, "Failed to delete game");
            e
        })?;

        let favorite_removed = {
            let mut state = self.write_state();
            state.games.retain(|g| g.id != id);
            let before = state.favorites.len();
            state.favorites.retain(|f| f.id != id);
            state.favorites.len() < before
        };

        self.persist_or_report(Collection::Games).await;
        self.persist_or_report(Collection::Favorites).await;
        self.emit(CatalogEvent::GamesChanged);
        if favorite_removed {
            self.emit(CatalogEvent::FavoritesChanged);
        }

        info!(id = id, favorite_removed, "Game deleted");
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    async fn read_stored<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Option<Vec<T>>, StoreError> {
        match self.store.get(collection.key()).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read a stored collection, treating unreadable values as absent
    async fn read_or_report<T: DeserializeOwned>(
        &self,
        collection: Collection,
        failures: &mut Vec<CatalogError>,
    ) -> Option<Vec<T>> {
        match self.read_stored(collection).await {
            Ok(value) => value,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Failed to read cached collection");
                failures.push(e.into());
                None
            }
        }
    }

    /// Write the current in-memory snapshot of `collection` to the store.
    ///
    /// Writes of one key are serialized and the snapshot is taken after the
    /// write lock is held, so the last write always carries the newest state.
    async fn persist(&self, collection: Collection) -> Result<(), StoreError> {
        let _guard = match collection {
            Collection::Games => self.games_write.lock().await,
            Collection::Categories => self.categories_write.lock().await,
            Collection::Favorites => self.favorites_write.lock().await,
        };

        let json = {
            let state = self.read_state();
            match collection {
                Collection::Games => serde_json::to_string(&state.games),
                Collection::Categories => serde_json::to_string(&state.categories),
                Collection::Favorites => serde_json::to_string(&state.favorites),
            }
        }?;

        self.store.set(collection.key(), &json).await
    }

    /// Persist, logging and publishing a failure instead of returning it
    async fn persist_or_report(&self, collection: Collection) -> Option<StoreError> {
        match self.persist(collection).await {
            Ok(()) => None,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Failed to persist collection");
                self.emit(CatalogEvent::PersistFailed {
                    collection,
                    message: e.to_string(),
                });
                Some(e)
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn replace_catalog(&self, games: Vec<Game>, categories: Vec<Category>) {
        let mut state = self.write_state();
        state.games = games;
        state.categories = categories;
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn lease_entity(&self, id: &str) -> EntityLease<'_> {
        let mut locks = self.entity_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(id.to_string()).or_default().clone();
        EntityLease {
            locks: &self.entity_locks,
            id: id.to_string(),
            lock,
        }
    }
}

/// Holds one reference to a per-id mutex and removes the map entry on drop
/// when no other lease shares it. Dropping happens on every exit path,
/// including a caller that abandons the future mid-await.
struct EntityLease<'a> {
    locks: &'a Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    id: String,
    lock: Arc<AsyncMutex<()>>,
}

impl Drop for EntityLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Leases are only cloned under this lock, so 2 means the map and us
        let unshared = locks
            .get(&self.id)
            .is_some_and(|l| Arc::ptr_eq(l, &self.lock) && Arc::strong_count(l) == 2);
        if unshared {
            locks.remove(&self.id);
        }
    }
}

/// Replace the entry with `id` by `replacement`. Returns whether one was found.
fn replace_by_id(games: &mut [Game], id: &str, replacement: &Game) -> bool {
    match games.iter_mut().find(|g| g.id == id) {
        Some(slot) => {
            *slot = replacement.clone();
            true
        }
        None => false,
    }
}

// ============================================================================
// Tests
// ============================================================================
