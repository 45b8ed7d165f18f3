//! # Store Switch Routes
//!
//! - `GET /stores/store/redirect`: decide the switch redirect (see
//!   [`StoreSwitchRedirect`]). Without `___store` the response is
//!   `204 No Content`.
//! - `GET /stores/store/switch`: complete the switch: check the target
//!   store, validate the switch token when present, remember the store in
//!   the `store` cookie, and send the shopper back to the decoded `uenc`.
//!
//! Both routes recover from a missing store by queuing a flash message and
//! redirecting to the current store's base URL. A session is resumed from
//! the cookie (or `SID` when sessions travel in URLs) and minted only when
//! something is written to it, so a pass-through sets no cookie.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::CookieJar;
use storeswitch_core::hash::has_hash_fields;
use storeswitch_core::redirect::SESSION_ID_PARAM;
use storeswitch_core::{
    decode_url, CurrentStoreResolver, HashError, MessageSink, RequestParams, StoreCode,
    StoreError, StoreRepository, StoreSwitchRedirect, StoreView, PARAM_STORE, PARAM_URL_ENCODED,
    STORE_NOT_FOUND_MESSAGE,
};
use url::Url;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::responder::{found, HttpResponder};
use crate::session::{site_cookie, CookieStoreResolver, RequestSession, STORE_COOKIE};
use crate::state::AppState;

/// Message queued when the target store exists but is disabled.
pub const STORE_INACTIVE_MESSAGE: &str = "Requested store is inactive";

/// Message queued when the switch token does not validate.
pub const INVALID_SWITCH_LINK_MESSAGE: &str =
    "The store switch link is invalid or has expired. Please try again.";

/// Build the store switch router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stores/store/redirect", get(redirect))
        .route("/stores/store/switch", get(switch))
}

/// GET /stores/store/redirect
async fn redirect(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let config = &state.config;
    let session = RequestSession::resume(
        &state.sessions,
        session_candidate(config, &jar, &params).as_deref(),
    );
    let store_code = cookie(&jar, STORE_COOKIE);

    let resolver =
        CookieStoreResolver::new(&state.stores, store_code.as_deref(), state.default_store);
    let hasher = state.hasher(session.customer_id());
    let responder = HttpResponder::new(&config.public_base_url, Some(&session));

    let handler = StoreSwitchRedirect::new(
        &state.stores,
        &resolver,
        &config.use_session_in_url,
        &hasher,
        &session,
    );
    let response =
        handler.execute(&params, &responder, StatusCode::NO_CONTENT.into_response())?;

    Ok((session.persist(jar, &config.session_cookie), response))
}

/// Why a switch could not be completed.
#[derive(Debug, thiserror::Error)]
enum SwitchError {
    #[error("no target store requested")]
    MissingTarget,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("target store \"{0}\" is inactive")]
    Inactive(StoreCode),

    #[error("switch token rejected: {0}")]
    Hash(#[from] HashError),
}

impl SwitchError {
    fn user_message(&self) -> &'static str {
        match self {
            Self::MissingTarget | Self::Store(_) => STORE_NOT_FOUND_MESSAGE,
            Self::Inactive(_) => STORE_INACTIVE_MESSAGE,
            Self::Hash(_) => INVALID_SWITCH_LINK_MESSAGE,
        }
    }
}

struct Switched {
    store: StoreView,
    return_url: Url,
    customer_id: Option<u64>,
}

/// GET /stores/store/switch
async fn switch(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Result<(CookieJar, Response), AppError> {
    let config = &state.config;
    let session = RequestSession::resume(
        &state.sessions,
        session_candidate(config, &jar, &params).as_deref(),
    );

    let (jar, response) = match complete_switch(&state, &params) {
        Ok(switched) => {
            if let Some(customer_id) = switched.customer_id {
                session.set_customer(customer_id);
            }
            tracing::info!(
                store = %switched.store.code,
                customer_id = switched.customer_id,
                return_url = %switched.return_url,
                "store switched"
            );
            let response = found(StatusCode::NO_CONTENT.into_response(), &switched.return_url);
            let jar = jar.add(site_cookie(STORE_COOKIE, switched.store.code.to_string()));
            (jar, response)
        }
        Err(SwitchError::Store(err)) if !err.is_not_found() => return Err(err.into()),
        Err(err) => {
            tracing::warn!(error = %err, "store switch rejected; falling back to current store");
            let store_code = cookie(&jar, STORE_COOKIE);
            let resolver = CookieStoreResolver::new(
                &state.stores,
                store_code.as_deref(),
                state.default_store,
            );
            let current = state.stores.get_by_id(resolver.current_store_id())?;
            session.add_error(err.user_message());
            (jar, found(StatusCode::NO_CONTENT.into_response(), &current.base_url))
        }
    };

    Ok((session.persist(jar, &config.session_cookie), response))
}

/// Value of cookie `name`.
fn cookie(jar: &CookieJar, name: &str) -> Option<String> {
    jar.get(name).map(|c| c.value().to_string())
}

/// Session id named by the request: the session cookie, or the `SID`
/// query parameter when sessions travel in URLs.
fn session_candidate(
    config: &AppConfig,
    jar: &CookieJar,
    params: &HashMap<String, String>,
) -> Option<String> {
    cookie(jar, &config.session_cookie).or_else(|| {
        config
            .use_session_in_url
            .then(|| params.param(SESSION_ID_PARAM).map(str::to_string))
            .flatten()
    })
}

fn complete_switch(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<Switched, SwitchError> {
    let target_code = params.param(PARAM_STORE).ok_or(SwitchError::MissingTarget)?;
    let store = state.stores.get(target_code)?;
    if !store.is_active {
        return Err(SwitchError::Inactive(store.code));
    }

    // The signature covers the query's ___from_store.
    let customer_id = if has_hash_fields(params) {
        Some(state.hasher(None).validate_hash(params)?.customer_id)
    } else {
        None
    };

    let return_url = params
        .param(PARAM_URL_ENCODED)
        .and_then(|encoded| match decode_url(encoded) {
            Ok(url) if is_known_host(state, &url) => Some(url),
            Ok(url) => {
                tracing::warn!(url = %url, "return URL host is not a catalog store; ignoring");
                None
            }
            Err(err) => {
                tracing::debug!(error = %err, "undecodable return URL; ignoring");
                None
            }
        })
        .unwrap_or_else(|| store.base_url.clone());

    Ok(Switched {
        store,
        return_url,
        customer_id,
    })
}

/// Whether `url` shares an origin (scheme, host, port) with this service
/// or one of the catalog stores.
fn is_known_host(state: &AppState, url: &Url) -> bool {
    let same_origin = |base: &Url| {
        base.scheme() == url.scheme()
            && base.host_str() == url.host_str()
            && base.port_or_known_default() == url.port_or_known_default()
    };
    same_origin(&state.config.public_base_url)
        || state.stores.list().iter().any(|s| same_origin(&s.base_url))
}
