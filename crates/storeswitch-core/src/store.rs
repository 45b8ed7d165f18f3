//! # Store Views
//!
//! A store view is a configured storefront variant (locale, currency,
//! catalog scope) addressed by a short code such as `default` or `fr_ch`.
//!
//! ## Validation
//!
//! [`StoreCode`] enforces the storefront code format at construction:
//! lowercase ASCII letter first, then `[a-z0-9_]`, at most 32 characters.
//! Input is lowercased before validation so `Default` and `default` name
//! the same store.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ValidationError;

const MAX_CODE_LEN: usize = 32;

/// Numeric store view identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(u32);

impl StoreId {
    /// Wrap a raw id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated store view code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreCode(String);

impl StoreCode {
    /// Parse and validate a store code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the code is empty, too long, or has
    /// characters outside the allowed set.
    pub fn new(code: impl AsRef<str>) -> Result<Self, ValidationError> {
        let code = code.as_ref().trim().to_ascii_lowercase();
        if code.is_empty() {
            return Err(ValidationError::EmptyStoreCode);
        }
        if code.len() > MAX_CODE_LEN {
            return Err(ValidationError::StoreCodeTooLong(code));
        }
        let mut chars = code.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_lowercase());
        let rest_valid = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !starts_with_letter || !rest_valid {
            return Err(ValidationError::InvalidStoreCode(code));
        }
        Ok(Self(code))
    }

    /// Access the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StoreCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoreCode> for String {
    fn from(code: StoreCode) -> Self {
        code.0
    }
}

impl AsRef<str> for StoreCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoreCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A configured store view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreView {
    /// Numeric id, unique across the catalog.
    pub id: StoreId,
    /// Code, unique across the catalog.
    pub code: StoreCode,
    /// Display name.
    pub name: String,
    /// Absolute base URL the store is served from.
    pub base_url: Url,
    /// Inactive stores stay resolvable by code but cannot be switched to.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl StoreView {
    /// Build an active store view.
    pub fn new(id: StoreId, code: StoreCode, name: impl Into<String>, base_url: Url) -> Self {
        Self {
            id,
            code,
            name: name.into(),
            base_url,
            is_active: true,
        }
    }

    /// The store's code.
    pub fn code(&self) -> &StoreCode {
        &self.code
    }

    /// The store's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}
