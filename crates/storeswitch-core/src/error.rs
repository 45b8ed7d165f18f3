//! # Error Hierarchy
//!
//! Structured error types for store lookup and store-code validation,
//! built with `thiserror`. Hash and URL codec failures live next to their
//! modules ([`crate::hash::HashError`], [`crate::url_codec::UrlCodecError`]).

use thiserror::Error;

use crate::store::StoreId;

/// Errors raised by a [`crate::StoreRepository`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// No store view exists with the requested code.
    #[error("store not found: \"{code}\"")]
    NotFound {
        /// The code that failed to resolve.
        code: String,
    },

    /// No store view exists with the requested numeric id.
    #[error("store not found: id {0}")]
    NotFoundById(StoreId),

    /// The requested code is not a syntactically valid store code.
    #[error("invalid store code: {0}")]
    InvalidCode(#[from] ValidationError),

    /// The repository could not answer (backing service down, lock
    /// contention timeout, etc.).
    #[error("store repository unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether this error means "the requested store does not exist".
    ///
    /// Malformed codes count as missing: no store can carry them.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::NotFoundById(_) | Self::InvalidCode(_)
        )
    }
}

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Store code is empty.
    #[error("store code is empty")]
    EmptyStoreCode,

    /// Store code is longer than the allowed maximum.
    #[error("store code \"{0}\" exceeds 32 characters")]
    StoreCodeTooLong(String),

    /// Store code has a character outside `[a-z0-9_]` or does not start
    /// with a letter.
    #[error("invalid store code: \"{0}\" (expected a letter followed by [a-z0-9_])")]
    InvalidStoreCode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_are_recoverable() {
        assert!(StoreError::NotFound {
            code: "sv1".into()
        }
        .is_not_found());
        assert!(StoreError::NotFoundById(StoreId::new(7)).is_not_found());
        assert!(StoreError::InvalidCode(ValidationError::EmptyStoreCode).is_not_found());
    }

    #[test]
    fn unavailable_is_not_recoverable() {
        assert!(!StoreError::Unavailable("db down".into()).is_not_found());
    }

    #[test]
    fn error_display_carries_context() {
        let err = StoreError::NotFound {
            code: "sv9".into(),
        };
        assert!(err.to_string().contains("sv9"));
        assert!(StoreError::NotFoundById(StoreId::new(42))
            .to_string()
            .contains("42"));
    }
}
