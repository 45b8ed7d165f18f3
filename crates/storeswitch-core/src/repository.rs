//! # Store Repository
//!
//! Lookup contract for store views, plus a thread-safe in-memory catalog.
//!
//! The in-memory catalog is synchronous (`parking_lot::RwLock`, not
//! `tokio::sync`) because the lock is never held across `.await` points.
//! `parking_lot` locks are non-poisonable, so a panicking writer cannot
//! wedge every later lookup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::store::{StoreCode, StoreId, StoreView};

/// Store view lookup.
pub trait StoreRepository: Send + Sync {
    /// Find a store view by code.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no store carries `code`,
    /// [`StoreError::InvalidCode`] when `code` is not a valid store code.
    fn get(&self, code: &str) -> Result<StoreView, StoreError>;

    /// Find a store view by numeric id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFoundById`] when no store carries `id`.
    fn get_by_id(&self, id: StoreId) -> Result<StoreView, StoreError>;
}

#[derive(Debug, Default)]
struct Catalog {
    by_id: HashMap<StoreId, StoreView>,
    by_code: HashMap<StoreCode, StoreId>,
}

/// Cloneable in-memory store catalog. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreRepository {
    catalog: Arc<RwLock<Catalog>>,
}

impl InMemoryStoreRepository {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of views. Later entries replace earlier
    /// ones with the same id or code.
    pub fn from_views(views: impl IntoIterator<Item = StoreView>) -> Self {
        let repo = Self::new();
        for view in views {
            repo.insert(view);
        }
        repo
    }

    /// Insert or replace a store view, returning the view it displaced by id.
    pub fn insert(&self, view: StoreView) -> Option<StoreView> {
        let id = view.id;
        let code = view.code.clone();
        let mut guard = self.catalog.write();
        // Codes and ids stay one-to-one.
        if let Some(old_id) = guard.by_code.insert(code.clone(), id) {
            if old_id != id {
                guard.by_id.remove(&old_id);
            }
        }
        let previous = guard.by_id.insert(id, view);
        if let Some(prev) = &previous {
            if prev.code != code {
                guard.by_code.remove(&prev.code);
            }
        }
        previous
    }

    /// All store views, ordered by id.
    pub fn list(&self) -> Vec<StoreView> {
        let mut views: Vec<StoreView> = self.catalog.read().by_id.values().cloned().collect();
        views.sort_by_key(|v| v.id);
        views
    }

    /// Number of store views.
    pub fn len(&self) -> usize {
        self.catalog.read().by_id.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StoreRepository for InMemoryStoreRepository {
    fn get(&self, code: &str) -> Result<StoreView, StoreError> {
        let code = StoreCode::new(code)?;
        let guard = self.catalog.read();
        guard
            .by_code
            .get(&code)
            .and_then(|id| guard.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                code: code.to_string(),
            })
    }

    fn get_by_id(&self, id: StoreId) -> Result<StoreView, StoreError> {
        self.catalog
            .read()
            .by_id
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFoundById(id))
    }
}
