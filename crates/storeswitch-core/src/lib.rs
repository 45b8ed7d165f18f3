#![deny(missing_docs)]

//! # storeswitch-core: Store Switch Domain
//!
//! Domain types and the redirect decision for moving a shopper from one
//! store view to another. This crate has no HTTP dependency; the hosting
//! service supplies every collaborator through the traits defined here.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** A [`StoreCode`] is validated
//!    at construction, a [`StoreId`] is a distinct type from any other integer.
//!
//! 2. **Explicit collaborators.** [`StoreSwitchRedirect`] borrows its store
//!    repository, store resolver, session policy, hash generator, and message
//!    sink. Nothing is looked up from ambient state.
//!
//! 3. **One recoverable failure.** A store lookup that ends in
//!    [`StoreError::NotFound`] becomes an error message plus a fallback
//!    redirect. Every other [`StoreError`] is returned to the caller.
//!
//! ## Outcomes
//!
//! | `___store` | from-store lookup | Result                                  |
//! |------------|-------------------|-----------------------------------------|
//! | absent     | not attempted     | response returned untouched             |
//! | present    | found             | redirect to `stores/store/switch`       |
//! | present    | not found         | error message + redirect to current store |

pub mod error;
pub mod handler;
pub mod hash;
pub mod message;
pub mod redirect;
pub mod repository;
pub mod request;
pub mod resolver;
pub mod session;
pub mod store;
pub mod url_codec;

pub use error::{StoreError, ValidationError};
pub use handler::{StoreSwitchRedirect, STORE_NOT_FOUND_MESSAGE, SWITCH_PATH};
pub use hash::{HashData, HashError, HashGenerator, HashToken, HmacHashGenerator, SwitchKey};
pub use message::{Message, MessageKind, MessageQueue, MessageSink};
pub use redirect::{QueryParams, RedirectInstruction, RedirectTarget, Responder};
pub use repository::{InMemoryStoreRepository, StoreRepository};
pub use request::{RequestParams, PARAM_FROM_STORE, PARAM_STORE, PARAM_URL_ENCODED};
pub use resolver::{CurrentStoreResolver, FixedStoreResolver};
pub use session::SessionPolicy;
pub use store::{StoreCode, StoreId, StoreView};
pub use url_codec::{decode_url, encode_url, UrlCodecError};
