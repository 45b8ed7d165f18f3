//! # HTTP Responder
//!
//! Renders a [`RedirectTarget`] as a `302 Found` with a `Location` header,
//! keeping every header already on the response (cookies in particular).

use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use storeswitch_core::{RedirectTarget, Responder};
use url::Url;

use crate::error::AppError;
use crate::session::RequestSession;

/// Responder for one request.
pub struct HttpResponder<'a> {
    base_url: &'a Url,
    session: Option<&'a RequestSession<'a>>,
}

impl<'a> HttpResponder<'a> {
    /// Route targets are rendered against `base_url`. The session id is
    /// appended when the instruction allows it, minting a session if needed.
    pub fn new(base_url: &'a Url, session: Option<&'a RequestSession<'a>>) -> Self {
        Self { base_url, session }
    }
}

impl Responder for HttpResponder<'_> {
    type Response = Response;

    fn redirect(&self, response: Response, target: RedirectTarget) -> Response {
        let location = match target {
            RedirectTarget::Route(instruction) => {
                let session_id = match self.session {
                    Some(session) if !instruction.nosid => Some(session.id()),
                    _ => None,
                };
                match instruction.to_url(self.base_url, session_id) {
                    Ok(url) => url,
                    Err(err) => {
                        return AppError::Internal(format!(
                            "cannot render redirect to {}: {err}",
                            instruction.path
                        ))
                        .into_response()
                    }
                }
            }
            RedirectTarget::StoreBase(store) => store.base_url,
        };
        found(response, &location)
    }
}

/// Turn `response` into a `302 Found` pointing at `location`.
pub fn found(mut response: Response, location: &Url) -> Response {
    match HeaderValue::from_str(location.as_str()) {
        Ok(value) => {
            *response.status_mut() = StatusCode::FOUND;
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(err) => AppError::Internal(format!("redirect location not a header value: {err}"))
            .into_response(),
    }
}
