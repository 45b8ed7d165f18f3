//! # Flash Message Section
//!
//! `GET /customer/section/messages` returns the session's queued messages
//! and clears them, so each message is shown once.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use storeswitch_core::Message;

use crate::state::AppState;

/// Response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesSection {
    pub messages: Vec<Message>,
}

/// Build the message section router.
pub fn router() -> Router<AppState> {
    Router::new().route("/customer/section/messages", get(load))
}

/// GET /customer/section/messages
async fn load(State(state): State<AppState>, jar: CookieJar) -> Json<MessagesSection> {
    let messages = jar
        .get(&state.config.session_cookie)
        .map(|c| c.value())
        .filter(|id| state.sessions.touch(id))
        .map(|id| state.sessions.take_messages(id))
        .unwrap_or_default();
    Json(MessagesSection { messages })
}
