//! # Store Switch Redirect
//!
//! The redirect decision behind `stores/store/redirect`. Given the inbound
//! request it produces exactly one of three outcomes:
//!
//! ```text
//! Start ──(___store absent)──────────────────────────────▶ NoOp
//!   │
//!   └──(___store present)──▶ Resolving ──(found)─────────▶ SwitchRedirect
//!                                │
//!                                └──(not found)──────────▶ ErrorRedirect
//! ```
//!
//! - **NoOp**: the response is returned untouched and no collaborator is
//!   called.
//! - **SwitchRedirect**: redirect to [`SWITCH_PATH`] carrying the from-store
//!   code, the target code, the encoded return URL, and the switch token.
//! - **ErrorRedirect**: queue [`STORE_NOT_FOUND_MESSAGE`] and redirect to the
//!   current store's base URL.
//!
//! Store lookup failures other than "not found" are returned to the caller.

use crate::error::StoreError;
use crate::hash::HashGenerator;
use crate::message::MessageSink;
use crate::redirect::{RedirectInstruction, RedirectTarget, Responder};
use crate::repository::StoreRepository;
use crate::request::{RequestParams, PARAM_FROM_STORE, PARAM_STORE, PARAM_URL_ENCODED};
use crate::resolver::CurrentStoreResolver;
use crate::session::SessionPolicy;
use crate::store::StoreView;

/// Route that completes a store switch.
pub const SWITCH_PATH: &str = "stores/store/switch";

/// Message queued when the from-store cannot be resolved.
pub const STORE_NOT_FOUND_MESSAGE: &str = "Requested store is not found";

/// Redirect handler for one request. Borrows every collaborator.
pub struct StoreSwitchRedirect<'a> {
    stores: &'a dyn StoreRepository,
    current: &'a dyn CurrentStoreResolver,
    session: &'a dyn SessionPolicy,
    hasher: &'a dyn HashGenerator,
    messages: &'a dyn MessageSink,
}

impl<'a> StoreSwitchRedirect<'a> {
    /// Wire the handler to its collaborators.
    pub fn new(
        stores: &'a dyn StoreRepository,
        current: &'a dyn CurrentStoreResolver,
        session: &'a dyn SessionPolicy,
        hasher: &'a dyn HashGenerator,
        messages: &'a dyn MessageSink,
    ) -> Self {
        Self {
            stores,
            current,
            session,
            hasher,
            messages,
        }
    }

    /// Decide the redirect for `request` and apply it to `response`.
    ///
    /// # Errors
    ///
    /// Returns the repository's error for any failure other than "store
    /// not found" (see [`StoreError::is_not_found`]), including a failure to
    /// load the current store on the fallback path.
    pub fn execute<R: Responder>(
        &self,
        request: &impl RequestParams,
        responder: &R,
        response: R::Response,
    ) -> Result<R::Response, StoreError> {
        let Some(target_code) = request.param(PARAM_STORE) else {
            tracing::debug!("no target store requested; response passed through");
            return Ok(response);
        };
        let from_code = request.param(PARAM_FROM_STORE);
        let encoded_url = request.param(PARAM_URL_ENCODED);

        let lookup = match from_code {
            Some(code) => self.stores.get(code),
            None => Err(StoreError::NotFound {
                code: String::new(),
            }),
        };

        match lookup {
            Ok(from_store) => {
                let instruction = self.switch_instruction(&from_store, target_code, encoded_url);
                tracing::info!(
                    from_store = %from_store.code,
                    target_store = target_code,
                    nosid = instruction.nosid,
                    "redirecting to store switch"
                );
                Ok(responder.redirect(response, RedirectTarget::Route(instruction)))
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    from_store = from_code.unwrap_or_default(),
                    target_store = target_code,
                    error = %err,
                    "store switch source not found; falling back to current store"
                );
                let current = self.stores.get_by_id(self.current.current_store_id())?;
                self.messages.add_error(STORE_NOT_FOUND_MESSAGE);
                Ok(responder.redirect(response, RedirectTarget::StoreBase(current)))
            }
            Err(err) => Err(err),
        }
    }

    fn switch_instruction(
        &self,
        from_store: &StoreView,
        target_code: &str,
        encoded_url: Option<&str>,
    ) -> RedirectInstruction {
        let from_code = from_store.code().as_str();
        let use_sid = self.session.use_session_in_url();
        let token = self.hasher.generate_hash(from_store);

        let mut instruction = RedirectInstruction::new(SWITCH_PATH);
        instruction.nosid = !use_sid;
        instruction.query.set(PARAM_FROM_STORE, from_code);
        instruction.query.set(PARAM_STORE, target_code);
        if let Some(encoded) = encoded_url {
            instruction.query.set(PARAM_URL_ENCODED, encoded);
        }
        instruction.query.extend(token.fields());
        instruction
    }
}
