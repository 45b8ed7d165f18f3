//! # Switch Hash
//!
//! A signed token attached to the store switch redirect so the target store
//! can trust which customer is moving and where they came from.
//!
//! ## Token Format
//!
//! ```text
//! customer_id=<u64>&time_stamp=<unix seconds>&___from_store=<code>&signature=<hex>
//! signature = hex(HMAC-SHA256(key, "{customer_id},{time_stamp},{from_store}"))
//! ```
//!
//! Guests get an empty token: there is no customer session to carry over.
//! Validation rejects tokens older than the TTL, tokens dated further
//! than the TTL in the future, and any signature mismatch. The signature
//! comparison is constant-time.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::error::ValidationError;
use crate::redirect::QueryParams;
use crate::request::{RequestParams, PARAM_FROM_STORE};
use crate::store::{StoreCode, StoreView};

type HmacSha256 = Hmac<Sha256>;

/// Customer id field.
pub const FIELD_CUSTOMER_ID: &str = "customer_id";
/// Issue time field (unix seconds).
pub const FIELD_TIME_STAMP: &str = "time_stamp";
/// Signature field.
pub const FIELD_SIGNATURE: &str = "signature";

/// Default validity window for a switch token.
pub const DEFAULT_TTL_SECS: i64 = 60;

/// Errors from switch key setup and token validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HashError {
    /// The key is empty.
    #[error("switch key must not be empty")]
    EmptyKey,

    /// A required token field is absent.
    #[error("switch token is missing \"{0}\"")]
    MissingField(&'static str),

    /// A token field has the wrong format.
    #[error("switch token field \"{0}\" is malformed")]
    Malformed(&'static str),

    /// The token's from-store is not a valid store code.
    #[error("switch token store code: {0}")]
    InvalidStoreCode(#[from] ValidationError),

    /// The token is older than the TTL.
    #[error("switch token expired {age_secs}s after issue")]
    Expired {
        /// Seconds since issue.
        age_secs: i64,
    },

    /// The token is dated further in the future than the TTL allows.
    #[error("switch token issued in the future")]
    NotYetValid,

    /// The signature does not match.
    #[error("switch token signature mismatch")]
    SignatureMismatch,
}

/// HMAC key used to sign switch tokens. `Debug` never prints key material.
#[derive(Clone)]
pub struct SwitchKey {
    mac: HmacSha256,
}

impl SwitchKey {
    /// Prepare a key.
    ///
    /// # Errors
    ///
    /// [`HashError::EmptyKey`] if `key` is empty.
    pub fn new(key: &[u8]) -> Result<Self, HashError> {
        if key.is_empty() {
            return Err(HashError::EmptyKey);
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|_| HashError::EmptyKey)?;
        Ok(Self { mac })
    }

    /// Lowercase hex HMAC-SHA256 of `data`.
    pub fn sign(&self, data: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(data.as_bytes());
        mac.finalize()
            .into_bytes()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl std::fmt::Debug for SwitchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SwitchKey([REDACTED])")
    }
}

/// Opaque token fields appended to the switch redirect query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashToken(QueryParams);

impl HashToken {
    /// A token with no fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the token carries no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Token fields, in order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter()
    }

    /// Value of one field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name)
    }
}

/// Verified content of a switch token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashData {
    /// Customer moving between stores.
    pub customer_id: u64,
    /// Issue time, unix seconds.
    pub time_stamp: i64,
    /// Store the customer came from.
    pub from_store: StoreCode,
}

/// Produces the switch token for a from-store.
pub trait HashGenerator: Send + Sync {
    /// Token for switching away from `store`.
    fn generate_hash(&self, store: &StoreView) -> HashToken;
}

/// HMAC-SHA256 switch token generator and validator.
#[derive(Debug, Clone)]
pub struct HmacHashGenerator {
    key: Arc<SwitchKey>,
    customer_id: Option<u64>,
    ttl: Duration,
}

impl HmacHashGenerator {
    /// Generator for the given customer (`None` for guests).
    pub fn new(key: Arc<SwitchKey>, customer_id: Option<u64>) -> Self {
        Self {
            key,
            customer_id,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
        }
    }

    /// Override the validity window.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Token for `store` issued at `now`.
    pub fn generate_hash_at(&self, store: &StoreView, now: DateTime<Utc>) -> HashToken {
        let Some(customer_id) = self.customer_id else {
            return HashToken::empty();
        };
        let time_stamp = now.timestamp();
        let code = store.code.as_str();
        let signature = self.key.sign(&signing_input(customer_id, time_stamp, code));

        let mut fields = QueryParams::new();
        fields.set(FIELD_CUSTOMER_ID, customer_id.to_string());
        fields.set(FIELD_TIME_STAMP, time_stamp.to_string());
        fields.set(PARAM_FROM_STORE, code);
        fields.set(FIELD_SIGNATURE, signature);
        HashToken(fields)
    }

    /// Validate the token fields carried in `params` at `now`.
    ///
    /// # Errors
    ///
    /// See [`HashError`]. Freshness is checked before the signature.
    pub fn validate_hash_at(
        &self,
        params: &impl RequestParams,
        now: DateTime<Utc>,
    ) -> Result<HashData, HashError> {
        let customer_raw = required(params, FIELD_CUSTOMER_ID)?;
        let time_raw = required(params, FIELD_TIME_STAMP)?;
        let from_raw = required(params, PARAM_FROM_STORE)?;
        let signature = required(params, FIELD_SIGNATURE)?;

        let customer_id: u64 = customer_raw
            .parse()
            .map_err(|_| HashError::Malformed(FIELD_CUSTOMER_ID))?;
        let time_stamp: i64 = time_raw
            .parse()
            .map_err(|_| HashError::Malformed(FIELD_TIME_STAMP))?;
        let from_store = StoreCode::new(from_raw)?;

        let age_secs = now.timestamp().saturating_sub(time_stamp);
        if age_secs > self.ttl.num_seconds() {
            return Err(HashError::Expired { age_secs });
        }
        if age_secs.saturating_neg() > self.ttl.num_seconds() {
            return Err(HashError::NotYetValid);
        }

        // Signed over the raw field, not the normalized code.
        let expected = self.key.sign(&signing_input(customer_id, time_stamp, from_raw));
        let provided = signature.to_ascii_lowercase();
        if !bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
            return Err(HashError::SignatureMismatch);
        }

        Ok(HashData {
            customer_id,
            time_stamp,
            from_store,
        })
    }

    /// [`Self::validate_hash_at`] against the current time.
    ///
    /// # Errors
    ///
    /// See [`HashError`].
    pub fn validate_hash(&self, params: &impl RequestParams) -> Result<HashData, HashError> {
        self.validate_hash_at(params, Utc::now())
    }
}

impl HashGenerator for HmacHashGenerator {
    fn generate_hash(&self, store: &StoreView) -> HashToken {
        self.generate_hash_at(store, Utc::now())
    }
}

/// Whether `params` carry any switch token field.
pub fn has_hash_fields(params: &impl RequestParams) -> bool {
    [FIELD_CUSTOMER_ID, FIELD_TIME_STAMP, FIELD_SIGNATURE]
        .iter()
        .any(|name| params.param(name).is_some())
}

fn signing_input(customer_id: u64, time_stamp: i64, from_store: &str) -> String {
    format!("{customer_id},{time_stamp},{from_store}")
}

fn required<'a>(params: &'a impl RequestParams, name: &'static str) -> Result<&'a str, HashError> {
    params.param(name).ok_or(HashError::MissingField(name))
}
