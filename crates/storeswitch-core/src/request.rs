//! # Request Parameters
//!
//! Read-only view of the inbound request's named parameters, and the
//! parameter names the store switch flow uses.

use std::collections::{BTreeMap, HashMap};

/// Target store code.
pub const PARAM_STORE: &str = "___store";

/// Store the shopper is switching away from.
pub const PARAM_FROM_STORE: &str = "___from_store";

/// URL-encoded return target (see [`crate::url_codec`]).
pub const PARAM_URL_ENCODED: &str = "uenc";

/// Named parameter access on an inbound request.
pub trait RequestParams {
    /// Raw value of `name`, including empty strings.
    fn raw_param(&self, name: &str) -> Option<&str>;

    /// Value of `name`. Empty values count as absent.
    fn param(&self, name: &str) -> Option<&str> {
        self.raw_param(name).filter(|v| !v.is_empty())
    }
}

impl RequestParams for HashMap<String, String> {
    fn raw_param(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl RequestParams for BTreeMap<String, String> {
    fn raw_param(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}
