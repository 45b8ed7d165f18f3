//! # Integration Tests for storeswitch-api
//!
//! Drives the router end to end: health probes, the store redirect's three
//! outcomes, session id propagation, flash messages, and completing a
//! switch with and without a signed customer token.

use axum::body::Body;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum_extra::extract::cookie::Cookie;
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

use storeswitch_api::bootstrap::Catalog;
use storeswitch_api::config::AppConfig;
use storeswitch_api::routes::messages::MessagesSection;
use storeswitch_api::state::AppState;
use storeswitch_core::{encode_url, MessageKind, SwitchKey};

const CATALOG: &str = r#"
default_store: default
stores:
  - id: 1
    code: default
    name: Main
    base_url: http://shop.test/
  - id: 2
    code: sv1
    name: Second
    base_url: http://sv1.shop.test/
  - id: 3
    code: closed
    name: Closed
    base_url: http://closed.shop.test/
    is_active: false
"#;

/// Helper: build state over the test catalog.
fn test_state_with(configure: impl FnOnce(&mut AppConfig)) -> AppState {
    let mut config = AppConfig::new(Url::parse("http://shop.test/").unwrap());
    configure(&mut config);
    let catalog = Catalog::from_yaml(CATALOG).unwrap();
    AppState::new(
        config,
        catalog.stores,
        catalog.default_store,
        SwitchKey::new(b"integration-key").unwrap(),
    )
}

fn test_state() -> AppState {
    test_state_with(|_| {})
}

/// Helper: GET `uri` with an optional `Cookie` header.
async fn get(state: &AppState, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header("cookie", cookie);
    }
    storeswitch_api::app(state.clone())
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Helper: read response body as string.
async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> Url {
    Url::parse(response.headers()[LOCATION].to_str().unwrap()).unwrap()
}

fn set_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| Cookie::parse(v.to_string()).ok())
        .find(|c| c.name() == name)
        .map(|c| c.value().to_string())
}

fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

async fn messages(state: &AppState, sid: &str) -> MessagesSection {
    let response = get(
        state,
        "/customer/section/messages",
        Some(&format!("sid={sid}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    serde_json::from_str(&body_string(response).await).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = get(&test_state(), "/health/liveness", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = get(&test_state(), "/health/readiness", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Store Redirect -----------------------------------------------------------

#[tokio::test]
async fn test_redirect_without_target_passes_through() {
    let response = get(
        &test_state(),
        "/stores/store/redirect?___from_store=default",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(LOCATION).is_none());
}

#[tokio::test]
async fn test_passthrough_starts_no_session() {
    let state = test_state();
    for _ in 0..50 {
        let response = get(&state, "/stores/store/redirect", None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
    assert_eq!(state.sessions.len(), 0);
}

#[tokio::test]
async fn test_redirect_to_switch_for_known_store() {
    let state = test_state();
    let response = get(
        &state,
        "/stores/store/redirect?___store=sv1&___from_store=default&uenc=default",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response).as_str(),
        "http://shop.test/stores/store/switch?___from_store=default&___store=sv1&uenc=default"
    );
    // Nothing was written to a session, so none was started.
    assert!(set_cookie_value(&response, "sid").is_none());
    assert!(state.sessions.is_empty());
}

#[tokio::test]
async fn test_redirect_carries_sid_when_sessions_in_urls() {
    let state = test_state_with(|c| c.use_session_in_url = true);
    let response = get(
        &state,
        "/stores/store/redirect?___store=sv1&___from_store=default",
        None,
    )
    .await;
    let sid = set_cookie_value(&response, "sid").unwrap();
    assert_eq!(query_value(&location(&response), "SID"), Some(sid));
}

#[tokio::test]
async fn test_redirect_reuses_existing_session() {
    let state = test_state();
    let sid = state.sessions.create();
    let response = get(
        &state,
        "/stores/store/redirect?___store=sv1&___from_store=default",
        Some(&format!("sid={sid}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(set_cookie_value(&response, "sid").is_none());
    assert_eq!(state.sessions.len(), 1);
}

#[tokio::test]
async fn test_unknown_from_store_falls_back_with_message() {
    let state = test_state();
    let response = get(
        &state,
        "/stores/store/redirect?___store=sv1&___from_store=nowhere&uenc=default",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_str(), "http://shop.test/");

    let sid = set_cookie_value(&response, "sid").unwrap();
    let section = messages(&state, &sid).await;
    assert_eq!(section.messages.len(), 1);
    assert_eq!(section.messages[0].kind, MessageKind::Error);
    assert_eq!(section.messages[0].text, "Requested store is not found");

    // Messages are shown once.
    assert!(messages(&state, &sid).await.messages.is_empty());
}

#[tokio::test]
async fn test_fallback_uses_store_cookie() {
    let state = test_state();
    let response = get(
        &state,
        "/stores/store/redirect?___store=default&___from_store=nowhere",
        Some("store=sv1"),
    )
    .await;
    assert_eq!(location(&response).as_str(), "http://sv1.shop.test/");
}

#[tokio::test]
async fn test_messages_without_session_is_empty() {
    let response = get(&test_state(), "/customer/section/messages", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let section: MessagesSection = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(section.messages.is_empty());
}

// -- Store Switch -------------------------------------------------------------

#[tokio::test]
async fn test_customer_switch_round_trip() {
    let state = test_state();
    let sid = state.sessions.create();
    state
        .sessions
        .update(&sid, |r| r.customer_id = Some(42));

    let uenc = encode_url("http://sv1.shop.test/catalog/category/view/id/7");
    let response = get(
        &state,
        &format!("/stores/store/redirect?___store=sv1&___from_store=default&uenc={uenc}"),
        Some(&format!("sid={sid}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let switch_url = location(&response);
    assert_eq!(query_value(&switch_url, "customer_id").as_deref(), Some("42"));
    assert!(query_value(&switch_url, "signature").is_some());
    assert!(query_value(&switch_url, "time_stamp").is_some());

    // Follow the redirect with a fresh session, as the target store would.
    let uri = format!("{}?{}", switch_url.path(), switch_url.query().unwrap());
    let response = get(&state, &uri, None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        location(&response).as_str(),
        "http://sv1.shop.test/catalog/category/view/id/7"
    );
    assert_eq!(set_cookie_value(&response, "store").as_deref(), Some("sv1"));

    let new_sid = set_cookie_value(&response, "sid").unwrap();
    assert_ne!(new_sid, sid);
    assert_eq!(state.sessions.customer_id(&new_sid), Some(42));
}

#[tokio::test]
async fn test_switch_with_tampered_token_is_rejected() {
    let state = test_state();
    let sid = state.sessions.create();
    state
        .sessions
        .update(&sid, |r| r.customer_id = Some(42));
    let response = get(
        &state,
        "/stores/store/redirect?___store=sv1&___from_store=default",
        Some(&format!("sid={sid}")),
    )
    .await;
    let switch_url = location(&response);
    let tampered = switch_url.query().unwrap().replace("customer_id=42", "customer_id=43");

    let response = get(
        &state,
        &format!("{}?{}", switch_url.path(), tampered),
        Some(&format!("sid={sid}")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_str(), "http://shop.test/");
    assert!(set_cookie_value(&response, "store").is_none());

    let section = messages(&state, &sid).await;
    assert_eq!(section.messages.len(), 1);
    assert!(section.messages[0].text.contains("invalid or has expired"));
    assert_eq!(state.sessions.customer_id(&sid), Some(42));
}

#[tokio::test]
async fn test_guest_switch_without_return_url_lands_on_target_base() {
    let response = get(
        &test_state(),
        "/stores/store/switch?___from_store=default&___store=sv1",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_str(), "http://sv1.shop.test/");
    assert_eq!(set_cookie_value(&response, "store").as_deref(), Some("sv1"));
}

#[tokio::test]
async fn test_switch_ignores_foreign_return_url() {
    let uenc = encode_url("https://evil.test/phish");
    let response = get(
        &test_state(),
        &format!("/stores/store/switch?___from_store=default&___store=sv1&uenc={uenc}"),
        None,
    )
    .await;
    assert_eq!(location(&response).as_str(), "http://sv1.shop.test/");
}

#[tokio::test]
async fn test_switch_to_inactive_store_is_rejected() {
    let state = test_state();
    let response = get(
        &state,
        "/stores/store/switch?___from_store=default&___store=closed",
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response).as_str(), "http://shop.test/");

    let sid = set_cookie_value(&response, "sid").unwrap();
    let section = messages(&state, &sid).await;
    assert_eq!(section.messages[0].text, "Requested store is inactive");
}

#[tokio::test]
async fn test_switch_to_unknown_store_is_rejected() {
    let state = test_state();
    let response = get(
        &state,
        "/stores/store/switch?___from_store=default&___store=nowhere",
        None,
    )
    .await;
    assert_eq!(location(&response).as_str(), "http://shop.test/");
    let sid = set_cookie_value(&response, "sid").unwrap();
    assert_eq!(
        messages(&state, &sid).await.messages[0].text,
        "Requested store is not found"
    );
}

#[tokio::test]
async fn test_switch_rejects_return_url_with_other_scheme() {
    let uenc = encode_url("https://sv1.shop.test:80/catalog");
    let response = get(
        &test_state(),
        &format!("/stores/store/switch?___from_store=default&___store=sv1&uenc={uenc}"),
        None,
    )
    .await;
    assert_eq!(location(&response).as_str(), "http://sv1.shop.test/");
}

#[tokio::test]
async fn test_switch_resumes_session_from_sid_when_sessions_in_urls() {
    let state = test_state_with(|c| c.use_session_in_url = true);
    let sid = state.sessions.create();
    let response = get(
        &state,
        &format!("/stores/store/switch?___from_store=default&___store=nowhere&SID={sid}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(set_cookie_value(&response, "sid").is_none());
    assert_eq!(state.sessions.len(), 1);
    assert_eq!(
        messages(&state, &sid).await.messages[0].text,
        "Requested store is not found"
    );
}

#[tokio::test]
async fn test_sid_ignored_when_sessions_not_in_urls() {
    let state = test_state();
    let sid = state.sessions.create();
    let response = get(
        &state,
        &format!("/stores/store/switch?___from_store=default&___store=nowhere&SID={sid}"),
        None,
    )
    .await;
    let new_sid = set_cookie_value(&response, "sid").unwrap();
    assert_ne!(new_sid, sid);
    assert!(messages(&state, &sid).await.messages.is_empty());
}
