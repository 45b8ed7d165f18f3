//! Session policy consulted when rendering redirect URLs.

/// Whether session identifiers may be embedded in generated URLs.
pub trait SessionPolicy: Send + Sync {
    /// `true` when URLs should carry the session id (the `SID` parameter).
    fn use_session_in_url(&self) -> bool;
}

impl SessionPolicy for bool {
    fn use_session_in_url(&self) -> bool {
        *self
    }
}
