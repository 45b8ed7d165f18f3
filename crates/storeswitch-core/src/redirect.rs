//! # Redirect Instructions
//!
//! A [`RedirectTarget`] is what the store switch flow decides; a
//! [`Responder`] turns it into whatever the hosting framework sends back.
//! Keeping the two apart lets the decision be tested without HTTP.

use serde::Serialize;
use url::Url;

use crate::store::StoreView;

/// Session id query parameter appended when sessions travel in URLs.
pub const SESSION_ID_PARAM: &str = "SID";

/// Ordered query parameters. Setting an existing name replaces its value
/// in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Value of `name`, if set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for QueryParams {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

/// Redirect to a route path on the current site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectInstruction {
    /// Route path relative to the site base URL, e.g. `stores/store/switch`.
    pub path: String,
    /// Query parameters, in order.
    pub query: QueryParams,
    /// Suppress the session id even when the session policy allows it.
    pub nosid: bool,
}

impl RedirectInstruction {
    /// A redirect to `path` with no query.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: QueryParams::new(),
            nosid: false,
        }
    }

    /// Render against `base`.
    ///
    /// `base` is treated as a directory even without a trailing slash. The
    /// session id is appended only when `nosid` is false and an id is given.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] if `path` cannot be joined onto `base`.
    pub fn to_url(&self, base: &Url, session_id: Option<&str>) -> Result<Url, url::ParseError> {
        let mut dir = base.clone();
        if !dir.path().ends_with('/') {
            let path = format!("{}/", dir.path());
            dir.set_path(&path);
        }
        dir.set_query(None);
        dir.set_fragment(None);

        let mut url = dir.join(self.path.trim_start_matches('/'))?;
        let sid = session_id.filter(|_| !self.nosid);
        if !self.query.is_empty() || sid.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in self.query.iter() {
                pairs.append_pair(name, value);
            }
            if let Some(sid) = sid {
                pairs.append_pair(SESSION_ID_PARAM, sid);
            }
        }
        Ok(url)
    }
}

/// Where the shopper is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// A route on the current site, with query parameters.
    Route(RedirectInstruction),
    /// The base URL of a store view.
    StoreBase(StoreView),
}

/// Turns a [`RedirectTarget`] into the hosting framework's response.
pub trait Responder {
    /// The framework's response type.
    type Response;

    /// Issue a redirect to `target`, starting from `response`.
    fn redirect(&self, response: Self::Response, target: RedirectTarget) -> Self::Response;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn switch_instruction(nosid: bool) -> RedirectInstruction {
        let mut instruction = RedirectInstruction::new("stores/store/switch");
        instruction.nosid = nosid;
        instruction.query.set("___from_store", "default");
        instruction.query.set("___store", "sv1");
        instruction.query.set("uenc", "aHR0cDovL3Nob3AudGVzdC8~");
        instruction
    }

    #[test]
    fn set_replaces_in_place() {
        let mut query = QueryParams::new();
        query.set("a", "1");
        query.set("b", "2");
        query.set("a", "3");
        let pairs: Vec<_> = query.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn renders_path_and_query_in_order() {
        let base = Url::parse("http://shop.test/").unwrap();
        let url = switch_instruction(true).to_url(&base, Some("abc")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://shop.test/stores/store/switch?___from_store=default&___store=sv1&uenc=aHR0cDovL3Nob3AudGVzdC8%7E"
        );
    }

    #[test]
    fn appends_sid_when_allowed() {
        let base = Url::parse("http://shop.test/").unwrap();
        let url = switch_instruction(false).to_url(&base, Some("abc")).unwrap();
        assert_eq!(url.query_pairs().last().unwrap().1, "abc");
        assert!(url.as_str().ends_with("&SID=abc"));
    }

    #[test]
    fn no_sid_without_session() {
        let base = Url::parse("http://shop.test/").unwrap();
        let url = switch_instruction(false).to_url(&base, None).unwrap();
        assert!(!url.as_str().contains("SID="));
    }

    #[test]
    fn base_without_trailing_slash_is_a_directory() {
        let base = Url::parse("http://shop.test/fr?x=1").unwrap();
        let url = RedirectInstruction::new("/stores/store/switch")
            .to_url(&base, None)
            .unwrap();
        assert_eq!(url.as_str(), "http://shop.test/fr/stores/store/switch");
    }
}
