//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Docket API",
        version = "0.1.0",
        description = "Case intake, legal routing, and document generation for small legal disputes."
    ),
    paths(
        crate::routes::cases::create_case,
        crate::routes::cases::get_case,
        crate::routes::cases::update_strategy,
        crate::routes::cases::trigger_generation,
        crate::routes::cases::get_status,
        crate::routes::cases::get_decision,
        crate::routes::cases::list_documents,
        crate::routes::cases::retry_document,
        crate::routes::cases::reset_case,
        crate::routes::cases::transition_status,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::cases::CaseResponse,
        crate::routes::cases::UpdateStrategyRequest,
        crate::routes::cases::TriggerResponse,
        crate::routes::cases::StatusResponse,
        crate::routes::cases::DecisionResponse,
        crate::routes::cases::DocumentsResponse,
        crate::routes::cases::JobResponse,
        crate::routes::cases::ResetRequest,
        crate::routes::cases::StatusTransitionRequest,
    )),
    tags(
        (name = "cases", description = "Case lifecycle and document generation"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
