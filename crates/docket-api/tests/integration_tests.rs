//! # Integration Tests for docket-api
//!
//! Drives the router end to end with the in-memory store and development
//! collaborators: intake, fact updates, the trigger, owner scoping, gating,
//! reset, status transitions, and the OpenAPI document.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use docket_api::{AppConfig, AppState};
use docket_pipeline::PipelineConfig;

/// Helper: build the app and spawn its worker.
fn test_app() -> axum::Router {
    let (state, worker) = AppState::in_memory(AppConfig::default(), &PipelineConfig::default())
        .expect("default configuration is valid");
    tokio::spawn(worker.run());
    docket_api::app(state)
}

/// Helper: send a request and decode the JSON body.
async fn call(
    app: &axum::Router,
    method: &str,
    uri: &str,
    owner: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(owner) = owner {
        builder = builder.header("x-owner-id", owner.to_string());
    }
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

fn employment_facts(incident_date: Option<&str>) -> Value {
    json!({
        "domain": "employment",
        "key_facts": [
            "Worked at Acme Ltd for four years",
            "Dismissed without warning",
            "No disciplinary process was followed",
            "Final two months of wages unpaid",
            "Manager gave no written reasons"
        ],
        "desired_outcome": "reinstatement and back pay",
        "evidence": [{"id": "e1", "description": "payslips"}],
        "counterparty": "Acme Ltd",
        "incident_date": incident_date
    })
}

async fn open_case(app: &axum::Router, owner: Uuid) -> String {
    let (status, body) = call(app, "POST", "/v1/cases", Some(owner), None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

/// Poll the status route until the phase matches or the wait runs out.
async fn wait_for_phase(app: &axum::Router, owner: Uuid, id: &str, phase: &str) -> Value {
    let uri = format!("/v1/cases/{id}/status");
    let mut last = Value::Null;
    for _ in 0..200 {
        let (_, body) = call(app, "GET", &uri, Some(owner), None).await;
        if body["phase"] == phase {
            return body;
        }
        last = body;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("case never reached {phase}: {last}");
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_health_probes() {
    let app = test_app();
    let (status, body) = call(&app, "GET", "/health/liveness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
    let (status, body) = call(&app, "GET", "/health/readiness", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ready");
}

// -- Intake and owner scoping -------------------------------------------------

#[tokio::test]
async fn test_create_case_starts_gathering_draft() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let (status, body) = call(&app, "POST", "/v1/cases", Some(owner), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["phase"], "GATHERING");
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(body["locked"], false);
    assert_eq!(body["owner"], owner.to_string());
}

#[tokio::test]
async fn test_missing_owner_header_is_unauthorized() {
    let app = test_app();
    let (status, body) = call(&app, "POST", "/v1/cases", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_other_owner_sees_not_found() {
    let app = test_app();
    let id = open_case(&app, Uuid::new_v4()).await;
    let (status, _) = call(&app, "GET", &format!("/v1/cases/{id}"), Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_case_is_not_found() {
    let app = test_app();
    let uri = format!("/v1/cases/{}", Uuid::new_v4());
    let (status, body) = call(&app, "GET", &uri, Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// -- Facts and the trigger ----------------------------------------------------

#[tokio::test]
async fn test_insufficient_facts_are_reported() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;
    let (status, body) = call(
        &app,
        "POST",
        &format!("/v1/cases/{id}/generation"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["outcome"], "insufficient");
    assert_eq!(body["missing"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_invalid_strategy_update_is_rejected() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;
    let (status, body) = call(
        &app,
        "PUT",
        &format!("/v1/cases/{id}/strategy"),
        Some(owner),
        Some(json!({"claimed_amount": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["details"]["field"], "claimed_amount");
}

#[tokio::test]
async fn test_employment_case_generates_documents() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/v1/cases/{id}/strategy"),
        Some(owner),
        Some(employment_facts(None)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["facts"]["key_facts"].as_array().unwrap().len(), 5);

    let (status, body) = call(
        &app,
        "POST",
        &format!("/v1/cases/{id}/generation"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["attempt"], 1);

    let status_body = wait_for_phase(&app, owner, &id, "COMPLETED").await;
    assert_eq!(status_body["message"], "Your documents are ready.");
    assert_eq!(status_body["headline"], "1 of 1 documents generated");

    let (status, body) = call(
        &app,
        "GET",
        &format!("/v1/cases/{id}/decision"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"]["status"], "APPROVED");
    assert_eq!(body["decision"]["forum"], "employment-tribunal");
    assert_eq!(body["gate"]["allowed"], true);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/v1/cases/{id}/documents"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["document_type"], "et1-claim-form");
    assert_eq!(jobs[0]["status"], "COMPLETED");

    // Facts are frozen once generation has started.
    let (status, _) = call(
        &app,
        "PUT",
        &format!("/v1/cases/{id}/strategy"),
        Some(owner),
        Some(json!({"key_facts": ["one more"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A second trigger queues nothing.
    let (status, body) = call(
        &app,
        "POST",
        &format!("/v1/cases/{id}/generation"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "already_in_progress");
    assert_eq!(body["phase"], "COMPLETED");
}

#[tokio::test]
async fn test_expired_time_limit_blocks_and_reset_reopens() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;
    call(
        &app,
        "PUT",
        &format!("/v1/cases/{id}/strategy"),
        Some(owner),
        Some(employment_facts(Some("2001-01-15"))),
    )
    .await;
    let (status, _) = call(
        &app,
        "POST",
        &format!("/v1/cases/{id}/generation"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let status_body = wait_for_phase(&app, owner, &id, "BLOCKED").await;
    assert_eq!(status_body["gate"], "TIME_LIMIT_EXPIRED");
    assert!(status_body["message"].as_str().unwrap().contains("deadline"));

    let (_, body) = call(
        &app,
        "GET",
        &format!("/v1/cases/{id}/documents"),
        Some(owner),
        None,
    )
    .await;
    assert!(body["jobs"].as_array().unwrap().is_empty());

    let (status, body) = call(
        &app,
        "POST",
        &format!("/v1/cases/{id}/reset"),
        Some(owner),
        Some(json!({"reason": "adding facts"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "GATHERING");
    assert_eq!(body["locked"], false);

    let (status, _) = call(
        &app,
        "GET",
        &format!("/v1/cases/{id}/decision"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reset_requires_finished_case() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;
    let (status, body) = call(
        &app,
        "POST",
        &format!("/v1/cases/{id}/reset"),
        Some(owner),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_reset_rejects_malformed_body() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;
    let request = Request::builder()
        .method("POST")
        .uri(format!("/v1/cases/{id}/reset"))
        .header("x-owner-id", owner.to_string())
        .header("content-type", "application/json")
        .body(Body::from("{\"reason\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, body) = call(&app, "GET", &format!("/v1/cases/{id}"), Some(owner), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "GATHERING");
}

#[tokio::test]
async fn test_retry_requires_completed_case() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;
    let uri = format!("/v1/cases/{id}/documents/{}/retry", Uuid::new_v4());
    let (status, _) = call(&app, "POST", &uri, Some(owner), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// -- Status transitions -------------------------------------------------------

#[tokio::test]
async fn test_status_transitions() {
    let app = test_app();
    let owner = Uuid::new_v4();
    let id = open_case(&app, owner).await;
    let uri = format!("/v1/cases/{id}/status-transitions");

    let (status, body) = call(&app, "POST", &uri, Some(owner), Some(json!({"to": "DOCUMENT_SENT"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "DOCUMENT_SENT");

    let (status, _) = call(&app, "POST", &uri, Some(owner), Some(json!({"to": "DRAFT"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&app, "POST", &uri, Some(owner), Some(json!({"to": "NOT_A_STATUS"}))).await;
    assert!(status.is_client_error());
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_spec_lists_case_routes() {
    let app = test_app();
    let (status, body) = call(&app, "GET", "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/v1/cases"));
    assert!(paths.contains_key("/v1/cases/{id}/generation"));
    assert!(paths.contains_key("/v1/cases/{id}/documents/{job_id}/retry"));
}
