//! # Cart Persistence
//!
//! The storage port the checkout loads carts from and saves them to, two
//! adapters, and the serialised handle that makes each mutation atomic.
//!
//! ## Read-Modify-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UI event A ──┐                                                         │
//! │  UI event B ──┼──► SharedCart::update(f)                                │
//! │  UI event C ──┘          │                                              │
//! │                          ▼                                              │
//! │                 lock ─► load latest ─► f(&mut cart) ─► save ─► unlock   │
//! │                                                                         │
//! │  Each event sees the cart the previous one saved; none is lost.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use folio_core::validation::validate_uuid;
use folio_core::{Cart, CoreResult, InMemoryCatalog};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Storage Port
// =============================================================================

/// Where carts live between requests (local storage, cookie, database row...).
pub trait CartStore: Send + Sync {
    /// Returns the stored cart, or `None` if nothing was saved under `cart_id`.
    fn load(&self, cart_id: &str) -> StoreResult<Option<Cart>>;

    fn save(&self, cart: &Cart) -> StoreResult<()>;

    /// Deletes a cart. Returns whether one existed.
    fn delete(&self, cart_id: &str) -> StoreResult<bool>;
}

impl<S: CartStore + ?Sized> CartStore for Arc<S> {
    fn load(&self, cart_id: &str) -> StoreResult<Option<Cart>> {
        (**self).load(cart_id)
    }

    fn save(&self, cart: &Cart) -> StoreResult<()> {
        (**self).save(cart)
    }

    fn delete(&self, cart_id: &str) -> StoreResult<bool> {
        (**self).delete(cart_id)
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// Process-local store, for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: RwLock<HashMap<String, Cart>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored carts.
    pub fn len(&self) -> StoreResult<usize> {
        let carts = self.carts.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(carts.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self, cart_id: &str) -> StoreResult<Option<Cart>> {
        let carts = self.carts.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(carts.get(cart_id).cloned())
    }

    fn save(&self, cart: &Cart) -> StoreResult<()> {
        let mut carts = self.carts.write().map_err(|_| StoreError::LockPoisoned)?;
        carts.insert(cart.id.clone(), cart.clone());
        Ok(())
    }

    fn delete(&self, cart_id: &str) -> StoreResult<bool> {
        let mut carts = self.carts.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(carts.remove(cart_id).is_some())
    }
}

// =============================================================================
// JSON File Store
// =============================================================================

/// One pretty-printed JSON document per cart: `<dir>/<cart id>.json`.
///
/// Cart ids must be UUIDs, so an id can never name a path outside `dir`.
#[derive(Debug, Clone)]
pub struct JsonFileCartStore {
    dir: PathBuf,
}

impl JsonFileCartStore {
    /// Opens (and creates, if needed) the cart directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        info!(?dir, "Cart directory ready");
        Ok(JsonFileCartStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, cart_id: &str) -> StoreResult<PathBuf> {
        validate_uuid(cart_id)?;
        Ok(self.dir.join(format!("{}.json", cart_id)))
    }
}

impl CartStore for JsonFileCartStore {
    fn load(&self, cart_id: &str) -> StoreResult<Option<Cart>> {
        let path = self.path_for(cart_id)?;
        if !path.exists() {
            debug!(cart_id, "No stored cart");
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, cart: &Cart) -> StoreResult<()> {
        let path = self.path_for(&cart.id)?;
        let tmp = path.with_extension("json.tmp");

        // Write-then-rename so a crash never leaves a half-written cart.
        fs::write(&tmp, serde_json::to_vec_pretty(cart)?)?;
        fs::rename(&tmp, &path)?;

        debug!(cart_id = %cart.id, lines = cart.line_count(), "Cart saved");
        Ok(())
    }

    fn delete(&self, cart_id: &str) -> StoreResult<bool> {
        let path = self.path_for(cart_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Loads a JSON array of raw book records as a catalog.
pub fn load_catalog(path: &Path) -> StoreResult<InMemoryCatalog> {
    let contents = fs::read_to_string(path)?;
    let catalog = InMemoryCatalog::from_json(&contents)?;
    info!(?path, books = catalog.len(), "Catalog loaded");
    Ok(catalog)
}

// =============================================================================
// Shared Cart
// =============================================================================

/// One cart in a store, with mutations serialised behind a mutex.
///
/// Every operation reloads the cart from the store, so changes saved by
/// another handle are never overwritten with a stale copy from this one.
pub struct SharedCart<S: CartStore> {
    store: S,
    cart_id: String,
    lock: Mutex<()>,
}

impl<S: CartStore> SharedCart<S> {
    /// Handle for an existing (or not yet saved) cart id.
    pub fn new(store: S, cart_id: impl Into<String>) -> Self {
        SharedCart {
            store,
            cart_id: cart_id.into(),
            lock: Mutex::new(()),
        }
    }

    /// Creates and saves a fresh empty cart.
    pub fn create(store: S) -> StoreResult<Self> {
        let cart = Cart::new();
        store.save(&cart)?;
        info!(cart_id = %cart.id, "Cart created");
        Ok(Self::new(store, cart.id))
    }

    pub fn cart_id(&self) -> &str {
        &self.cart_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_latest(&self) -> StoreResult<Cart> {
        Ok(self.store.load(&self.cart_id)?.unwrap_or_else(|| Cart {
            id: self.cart_id.clone(),
            ..Cart::new()
        }))
    }

    /// Current cart, read under the lock.
    pub fn snapshot(&self) -> StoreResult<Cart> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        self.load_latest()
    }

    /// Runs `f` on the latest cart and saves the result, as one locked step.
    pub fn update<R>(&self, f: impl FnOnce(&mut Cart) -> R) -> StoreResult<R> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut cart = self.load_latest()?;
        let result = f(&mut cart);
        self.store.save(&cart)?;
        Ok(result)
    }

    /// Like [`SharedCart::update`], but nothing is saved if `f` fails.
    pub fn try_update<R>(&self, f: impl FnOnce(&mut Cart) -> CoreResult<R>) -> StoreResult<R> {
        let _guard = self.lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut cart = self.load_latest()?;
        let result = f(&mut cart)?;
        self.store.save(&cart)?;
        Ok(result)
    }
}
