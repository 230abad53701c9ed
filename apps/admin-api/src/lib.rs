//! # facturo-api
//!
//! JSON HTTP API for the Facturo admin panel: catalog, cart, checkout,
//! invoices and customers, with cookie or bearer sessions.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP request                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  TraceLayer (tower-http) ── span per request                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CurrentUser extractor ── IdentityService::authenticate                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  handler ── AccessPolicy gate ── facturo-core rules ── facturo-db        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Json<T> or ApiError { code, message }                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod identity;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// The complete application, ready to serve or to drive from tests.
pub fn build_router(state: Arc<AppState>) -> Router {
    routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
