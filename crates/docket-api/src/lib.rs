//! # docket-api: Axum API Services for the Docket Stack
//!
//! Thin HTTP layer over `docket-pipeline`. Handlers validate input, scope
//! every case to its owner, and delegate to the
//! [`LifecycleController`](docket_pipeline::LifecycleController).
//!
//! ## API Surface
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /v1/cases` | open a case |
//! | `GET /v1/cases/{id}` | case record and facts |
//! | `PUT /v1/cases/{id}/strategy` | merge facts (409 while locked) |
//! | `POST /v1/cases/{id}/generation` | fire-and-forget trigger |
//! | `GET /v1/cases/{id}/status` | phase, message, progress |
//! | `GET /v1/cases/{id}/decision` | routing decision and gate |
//! | `GET /v1/cases/{id}/documents` | document jobs |
//! | `POST /v1/cases/{id}/documents/{job_id}/retry` | manual retry |
//! | `POST /v1/cases/{id}/reset` | back to GATHERING |
//! | `POST /v1/cases/{id}/status-transitions` | user-facing status |
//!
//! ## Middleware Stack
//!
//! ```text
//! TraceLayer → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::{AppConfig, AppState};

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::cases::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
