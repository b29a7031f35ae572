//! HTTP surface tests

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use board_governance::api::router;
use common::*;

async fn call(
    h: &Harness,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router(h.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn proposal_body() -> Value {
    json!({
        "proposed_officer_name": "Jane Doe",
        "proposed_officer_email": "jane@example.com",
        "proposed_title": "CFO",
        "effective_date": "2026-02-01"
    })
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new().await;
    let (status, body) = call(&h, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_or_bad_token() {
    let h = Harness::new().await;
    let (status, body) = call(&h, "POST", "/api/appointments", None, Some(proposal_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["kind"], "authentication_error");

    let bad_token = Some("not-a-jwt");
    let (status, _) = call(&h, "POST", "/api/appointments", bad_token, Some(proposal_body())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_propose_vote_adopt_execute_over_http() {
    let h = Harness::new().await;
    let secretary_token = token_for(&secretary());
    let member = board_member(&h.database, "director-a").await;
    let member_token = token_for(&member);

    let (status, body) = call(
        &h,
        "POST",
        "/api/appointments",
        Some(&secretary_token),
        Some(proposal_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["resolution"]["status"], "PENDING_VOTE");
    assert_eq!(body["data"]["appointment"]["status"], "SENT_TO_BOARD");
    let resolution_id = body["data"]["resolution"]["id"].as_str().unwrap().to_string();
    let appointment_id = body["data"]["appointment"]["id"].as_str().unwrap().to_string();

    let votes_uri = format!("/api/resolutions/{}/votes", resolution_id);
    let yes = Some(json!({"vote": "yes"}));
    let (status, body) = call(&h, "POST", &votes_uri, Some(&member_token), yes).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tally"]["yes"], 1);

    let maybe = Some(json!({"vote": "maybe"}));
    let (status, body) = call(&h, "POST", &votes_uri, Some(&member_token), maybe).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["kind"], "validation_error");

    // Board members may vote but not override.
    let adopt_uri = format!("/api/resolutions/{}/adopt", resolution_id);
    let (status, _) = call(&h, "POST", &adopt_uri, Some(&member_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let execute_uri = format!("/api/resolutions/{}/execute", resolution_id);
    let (status, body) = call(&h, "POST", &execute_uri, Some(&secretary_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["details"]["kind"], "state_error");

    let (status, body) = call(&h, "POST", &adopt_uri, Some(&secretary_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ADOPTED");

    let (status, body) = call(&h, "POST", &execute_uri, Some(&secretary_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["resolution"]["status"], "EXECUTED");
    assert_eq!(body["data"]["execution"]["outcome"], "appointment");
    assert_eq!(body["data"]["execution"]["appointment_id"], appointment_id.as_str());
    assert_eq!(body["data"]["execution"]["user_created"], true);
    assert_eq!(body["data"]["execution"]["email_sent"], true);

    let (status, body) = call(
        &h,
        "GET",
        &format!("/api/resolutions/{}/tally", resolution_id),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"yes": 1, "no": 0, "abstain": 0}));
}

#[tokio::test]
async fn test_document_routes() {
    let h = Harness::new().await;
    let token = token_for(&secretary());
    let (appointment_id, _) = h
        .approved_appointment(new_appointment("Jane Doe", "jane@example.com", "CEO"))
        .await;

    let (status, body) = call(
        &h,
        "POST",
        &format!("/api/appointments/{}/documents", appointment_id),
        Some(&token),
        Some(json!({"document_type": "certificate"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["document_type"], "certificate");

    let (status, _) = call(
        &h,
        "POST",
        &format!("/api/appointments/{}/documents", appointment_id),
        Some(&token),
        Some(json!({"document_type": "napkin_sketch"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &h,
        "POST",
        "/api/documents/backfill",
        Some(&token),
        Some(json!({"appointment_id": appointment_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // The certificate already exists.
    assert_eq!(body["data"]["documents_generated"], 5);
    assert_eq!(body["data"]["errors_count"], 0);

    let (status, body) = call(
        &h,
        "POST",
        &format!("/api/appointments/{}/banking-packet", appointment_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["flags"]["can_sign_wires"], true);
    assert_eq!(body["data"]["packet_version"], 1);
}

#[tokio::test]
async fn test_backfill_requires_document_capability() {
    let h = Harness::new().await;
    let member = board_member(&h.database, "director-a").await;

    let (status, body) = call(
        &h,
        "POST",
        "/api/documents/backfill",
        Some(&token_for(&member)),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_unknown_resolution_is_not_found() {
    let h = Harness::new().await;
    let (status, body) = call(
        &h,
        "GET",
        "/api/resolutions/does-not-exist/tally",
        Some(&token_for(&secretary())),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["kind"], "not_found");
}

#[tokio::test]
async fn test_malformed_body_uses_envelope() {
    let h = Harness::new().await;
    let (status, body) = call(
        &h,
        "POST",
        "/api/appointments",
        Some(&token_for(&secretary())),
        Some(json!({"proposed_title": "CFO"})),
    )
    .await;
    assert!(status.is_client_error());
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["kind"], "validation_error");
}
