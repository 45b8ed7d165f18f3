//! # Current Store Resolution
//!
//! Answers "which store view is the shopper on right now". The redirect
//! handler only asks this on the fallback path, after a failed switch.

use crate::store::StoreId;

/// Resolves the id of the store view serving the current request.
pub trait CurrentStoreResolver: Send + Sync {
    /// The current store id. Always succeeds; implementations fall back to
    /// the catalog default.
    fn current_store_id(&self) -> StoreId;
}

/// Resolver that always answers with one configured store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedStoreResolver(StoreId);

impl FixedStoreResolver {
    /// Resolve every request to `id`.
    pub const fn new(id: StoreId) -> Self {
        Self(id)
    }
}

impl CurrentStoreResolver for FixedStoreResolver {
    fn current_store_id(&self) -> StoreId {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_resolver_returns_configured_id() {
        let resolver = FixedStoreResolver::new(StoreId::new(3));
        assert_eq!(resolver.current_store_id(), StoreId::new(3));
    }
}
