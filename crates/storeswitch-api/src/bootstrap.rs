//! # Catalog Bootstrap
//!
//! Loads the store catalog and switch key at startup and assembles the
//! [`AppState`].
//!
//! ## Bootstrap Sequence
//!
//! 1. **Load Catalog**: Parse `STORE_CATALOG` YAML, or serve a single
//!    `default` store at the public base URL when unset.
//! 2. **Validate Catalog**: Unique ids and codes, default store present
//!    and active.
//! 3. **Load Switch Key**: From config, or generate an ephemeral one.
//! 4. **Log Catalog Summary**: Structured startup banner.
//!
//! ## Catalog Format
//!
//! ```yaml
//! default_store: default
//! stores:
//!   - id: 1
//!     code: default
//!     name: Main Website
//!     base_url: https://shop.example/
//!   - id: 2
//!     code: fr
//!     name: French
//!     base_url: https://shop.example/fr/
//!     is_active: true
//! ```

use std::collections::HashSet;
use std::path::Path;

use rand_core::{OsRng, RngCore};
use serde::Deserialize;
use storeswitch_core::{InMemoryStoreRepository, StoreCode, StoreId, StoreView, SwitchKey};
use url::Url;

use crate::config::AppConfig;
use crate::state::AppState;

/// Length of a generated switch key, in bytes.
const EPHEMERAL_KEY_LEN: usize = 32;

/// Errors during catalog bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Catalog file not found at the given path.
    #[error("store catalog not found: {path}")]
    CatalogNotFound { path: String },

    /// Catalog file is not valid YAML for the catalog schema.
    #[error("store catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Catalog failed validation.
    #[error("invalid store catalog: {errors:?}")]
    InvalidCatalog { errors: Vec<String> },

    /// Switch key could not be prepared.
    #[error("switch key error: {0}")]
    SwitchKey(String),

    /// IO error during bootstrap.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    default_store: String,
    stores: Vec<StoreView>,
}

/// Validated store catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Every store view.
    pub stores: InMemoryStoreRepository,
    /// Id of the default store.
    pub default_store: StoreId,
}

impl Catalog {
    /// Single active `default` store served at `base_url`.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::InvalidCatalog`] if the built-in code is rejected.
    pub fn single(base_url: Url) -> Result<Self, BootstrapError> {
        let default_store = StoreId::new(1);
        let code = StoreCode::new("default").map_err(|e| BootstrapError::InvalidCatalog {
            errors: vec![e.to_string()],
        })?;
        Ok(Self {
            stores: InMemoryStoreRepository::from_views([StoreView::new(
                default_store,
                code,
                "Default Store View",
                base_url,
            )]),
            default_store,
        })
    }

    /// Parse and validate catalog YAML.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::Parse`] for malformed YAML,
    /// [`BootstrapError::InvalidCatalog`] listing every validation failure.
    pub fn from_yaml(yaml: &str) -> Result<Self, BootstrapError> {
        let file: CatalogFile = serde_yaml::from_str(yaml)?;
        let mut errors = Vec::new();

        if file.stores.is_empty() {
            errors.push("catalog lists no stores".to_string());
        }

        let mut ids = HashSet::new();
        let mut codes = HashSet::new();
        for store in &file.stores {
            if !ids.insert(store.id) {
                errors.push(format!("duplicate store id {}", store.id));
            }
            if !codes.insert(store.code.clone()) {
                errors.push(format!("duplicate store code \"{}\"", store.code));
            }
            if !matches!(store.base_url.scheme(), "http" | "https") {
                errors.push(format!(
                    "store \"{}\" base_url must be http(s): {}",
                    store.code, store.base_url
                ));
            }
        }

        let default_store = match StoreCode::new(&file.default_store) {
            Ok(code) => match file.stores.iter().find(|s| s.code == code) {
                Some(store) if store.is_active => Some(store.id),
                Some(_) => {
                    errors.push(format!("default store \"{code}\" is inactive"));
                    None
                }
                None => {
                    errors.push(format!("default store \"{code}\" is not in the catalog"));
                    None
                }
            },
            Err(err) => {
                errors.push(format!("default_store: {err}"));
                None
            }
        };

        match default_store {
            Some(default_store) if errors.is_empty() => Ok(Self {
                stores: InMemoryStoreRepository::from_views(file.stores),
                default_store,
            }),
            _ => Err(BootstrapError::InvalidCatalog { errors }),
        }
    }

    /// Read and validate a catalog file.
    ///
    /// # Errors
    ///
    /// [`BootstrapError::CatalogNotFound`] if `path` does not exist, plus
    /// everything [`Self::from_yaml`] returns.
    pub fn load(path: &Path) -> Result<Self, BootstrapError> {
        if !path.exists() {
            return Err(BootstrapError::CatalogNotFound {
                path: path.display().to_string(),
            });
        }
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

/// Build the application state from configuration.
///
/// # Errors
///
/// Any catalog or switch key failure; see [`BootstrapError`].
pub fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading store catalog");
            Catalog::load(path)?
        }
        None => {
            tracing::info!("STORE_CATALOG not set; serving a single default store");
            Catalog::single(config.public_base_url.clone())?
        }
    };

    let (switch_key, ephemeral) = load_switch_key(config.switch_key.as_deref())?;

    tracing::info!(
        stores = catalog.stores.len(),
        default_store = %catalog.default_store,
        public_base_url = %config.public_base_url,
        use_session_in_url = config.use_session_in_url,
        switch_key_ephemeral = ephemeral,
        "store catalog ready"
    );

    Ok(AppState::new(
        config,
        catalog.stores,
        catalog.default_store,
        switch_key,
    ))
}

/// Prepare the switch key, generating an ephemeral one when unset.
/// Returns the key and whether it is ephemeral.
fn load_switch_key(configured: Option<&str>) -> Result<(SwitchKey, bool), BootstrapError> {
    match configured {
        Some(secret) => SwitchKey::new(secret.as_bytes())
            .map(|key| (key, false))
            .map_err(|e| BootstrapError::SwitchKey(e.to_string())),
        None => {
            tracing::warn!(
                "STORE_SWITCH_KEY not set; using an ephemeral key. Switch links will not \
                 survive a restart or validate across instances."
            );
            SwitchKey::new(&ephemeral_key_bytes())
                .map(|key| (key, true))
                .map_err(|e| BootstrapError::SwitchKey(e.to_string()))
        }
    }
}

/// 256 bits from the operating system RNG.
fn ephemeral_key_bytes() -> [u8; EPHEMERAL_KEY_LEN] {
    let mut bytes = [0u8; EPHEMERAL_KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    bytes
}
