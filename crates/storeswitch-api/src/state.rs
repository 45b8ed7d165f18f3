//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Everything here is cheap to clone: the
//! catalog and session map are `Arc`-backed.

use std::sync::Arc;

use chrono::Duration;
use storeswitch_core::{HmacHashGenerator, InMemoryStoreRepository, StoreId, SwitchKey};

use crate::config::AppConfig;
use crate::session::{SessionStore, DEFAULT_MAX_SESSIONS};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: Arc<AppConfig>,
    /// Store catalog.
    pub stores: InMemoryStoreRepository,
    /// Store served when the request does not pick one.
    pub default_store: StoreId,
    /// Key signing switch tokens.
    pub switch_key: Arc<SwitchKey>,
    /// Shopper sessions.
    pub sessions: SessionStore,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("stores", &self.stores.len())
            .field("default_store", &self.default_store)
            .field("switch_key", &self.switch_key)
            .field("sessions", &self.sessions.len())
            .finish()
    }
}

impl AppState {
    /// Assemble state from its parts. The session map starts empty, with
    /// the configured idle TTL.
    pub fn new(
        config: AppConfig,
        stores: InMemoryStoreRepository,
        default_store: StoreId,
        switch_key: SwitchKey,
    ) -> Self {
        let sessions = SessionStore::new(
            Duration::seconds(config.session_idle_secs),
            DEFAULT_MAX_SESSIONS,
        );
        Self {
            config: Arc::new(config),
            stores,
            default_store,
            switch_key: Arc::new(switch_key),
            sessions,
        }
    }

    /// Switch token generator/validator for `customer_id`.
    pub fn hasher(&self, customer_id: Option<u64>) -> HmacHashGenerator {
        HmacHashGenerator::new(Arc::clone(&self.switch_key), customer_id)
            .with_ttl(Duration::seconds(self.config.hash_ttl_secs))
    }
}
