//! # storeswitch-api: Axum Storefront Store Switching
//!
//! HTTP surface for moving a shopper between store views.
//!
//! ## API Surface
//!
//! | Route                          | Module               | Purpose                         |
//! |--------------------------------|----------------------|---------------------------------|
//! | `GET /stores/store/redirect`   | [`routes::store`]    | Decide the switch redirect      |
//! | `GET /stores/store/switch`     | [`routes::store`]    | Complete the switch             |
//! | `GET /customer/section/messages` | [`routes::messages`] | Drain queued flash messages   |
//! | `GET /health/*`                | this module          | Liveness and readiness probes   |
//!
//! ## Middleware Stack
//!
//! ```text
//! TraceLayer → Handler
//! ```

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod responder;
pub mod routes;
pub mod session;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let storefront = Router::new()
        .merge(routes::store::router())
        .merge(routes::messages::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(storefront)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
