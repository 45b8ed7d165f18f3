//! # Service Configuration
//!
//! Read from the environment at startup. Every variable is optional:
//!
//! | Variable                      | Default                  |
//! |-------------------------------|--------------------------|
//! | `PORT`                        | `8080`                   |
//! | `PUBLIC_BASE_URL`             | `http://localhost:8080/` |
//! | `STORE_CATALOG`               | single `default` store   |
//! | `USE_SESSION_IN_URL`          | `false`                  |
//! | `SESSION_COOKIE`              | `sid`                    |
//! | `STORE_SWITCH_KEY`            | ephemeral (warns)        |
//! | `STORE_SWITCH_HASH_TTL_SECS`  | `60`                     |
//! | `SESSION_IDLE_SECS`           | `1800`                   |
//!
//! With `USE_SESSION_IN_URL` on, generated switch links carry `SID=<id>` and
//! both store routes accept it when the request has no session cookie.

use std::path::PathBuf;

use storeswitch_core::hash::DEFAULT_TTL_SECS;
use url::Url;

use crate::session::DEFAULT_SESSION_IDLE_SECS;

/// Errors reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: \"{value}\" ({reason})")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Base URL the service is reachable at; switch routes are rendered
    /// against it.
    pub public_base_url: Url,
    /// YAML store catalog. `None` serves a single `default` store.
    pub catalog_path: Option<PathBuf>,
    /// Whether generated URLs may carry the session id as `SID`, and
    /// whether `SID` is read back when no session cookie is sent.
    pub use_session_in_url: bool,
    /// Session cookie name.
    pub session_cookie: String,
    /// HMAC key for switch tokens. `None` means generate one at startup.
    pub switch_key: Option<String>,
    /// Switch token validity window, seconds.
    pub hash_ttl_secs: i64,
    /// Idle time before a session is dropped, seconds.
    pub session_idle_secs: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("public_base_url", &self.public_base_url.as_str())
            .field("catalog_path", &self.catalog_path)
            .field("use_session_in_url", &self.use_session_in_url)
            .field("session_cookie", &self.session_cookie)
            .field("switch_key", &self.switch_key.as_ref().map(|_| "[REDACTED]"))
            .field("hash_ttl_secs", &self.hash_ttl_secs)
            .field("session_idle_secs", &self.session_idle_secs)
            .finish()
    }
}

/// Public base URL when `PUBLIC_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/";

impl AppConfig {
    /// Configuration with every setting at its default except the base URL.
    pub fn new(public_base_url: Url) -> Self {
        Self {
            port: 8080,
            public_base_url,
            catalog_path: None,
            use_session_in_url: false,
            session_cookie: "sid".to_string(),
            switch_key: None,
            hash_ttl_secs: DEFAULT_TTL_SECS,
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }

    /// Read configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when a present value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let public_base_url =
            parse_base_url(get("PUBLIC_BASE_URL").as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let defaults = Self::new(public_base_url);

        let port = match get("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: v,
                reason: "expected a port number",
            })?,
            None => defaults.port,
        };

        let use_session_in_url = match get("USE_SESSION_IN_URL") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid {
                name: "USE_SESSION_IN_URL",
                value: v,
                reason: "expected true/false",
            })?,
            None => defaults.use_session_in_url,
        };

        let hash_ttl_secs = match get("STORE_SWITCH_HASH_TTL_SECS") {
            Some(v) => parse_secs("STORE_SWITCH_HASH_TTL_SECS", v)?,
            None => defaults.hash_ttl_secs,
        };
        let session_idle_secs = match get("SESSION_IDLE_SECS") {
            Some(v) => parse_secs("SESSION_IDLE_SECS", v)?,
            None => defaults.session_idle_secs,
        };

        Ok(Self {
            port,
            catalog_path: get("STORE_CATALOG").map(PathBuf::from),
            use_session_in_url,
            session_cookie: get("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            switch_key: get("STORE_SWITCH_KEY"),
            hash_ttl_secs,
            session_idle_secs,
            ..defaults
        })
    }
}

/// Parse an absolute http(s) base URL, normalizing it to end in `/`.
///
/// # Errors
///
/// [`ConfigError::Invalid`] for relative or non-http URLs.
pub fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "PUBLIC_BASE_URL",
        value: value.to_string(),
        reason: "expected an absolute http(s) URL",
    };
    let mut url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_secs(name: &'static str, value: String) -> Result<i64, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected a positive number of seconds",
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
