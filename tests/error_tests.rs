// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;
use spark_events::error::AppError;

async fn body_of(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_client_errors_map_to_4xx() {
    assert_eq!(
        AppError::NotFound("Event x not found".to_string()).status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::Conflict("User already exists".to_string()).status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::CapacityExhausted.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::Forbidden("nope".to_string()).status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        AppError::BadRequest("No fields to update".to_string()).status(),
        StatusCode::BAD_REQUEST
    );
}

#[test]
fn test_server_errors_map_to_500() {
    assert_eq!(
        AppError::UpstreamFailure("no row".to_string()).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Database("timeout".to_string()).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Internal(anyhow::anyhow!("boom")).status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_client_error_body_carries_details() {
    let (status, body) = body_of(AppError::Forbidden(
        "Only the event creator can edit this event".to_string(),
    ))
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["details"], "Only the event creator can edit this event");
}

#[tokio::test]
async fn test_capacity_error_body() {
    let (status, body) = body_of(AppError::CapacityExhausted).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "capacity_exhausted");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_database_error_hides_details() {
    let (status, body) = body_of(AppError::Database("connection refused at 10.0.0.3".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let (_, body) = body_of(AppError::Internal(anyhow::anyhow!("secret stack"))).await;

    assert_eq!(body["error"], "internal_error");
    assert!(body.get("details").is_none());
}

#[test]
fn test_validation_errors_become_bad_request() {
    use validator::Validate;

    let signup = spark_events::models::NewUser {
        id: None,
        name: String::new(),
        email: "not-an-email".to_string(),
    };
    let err: AppError = signup.validate().unwrap_err().into();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(err.kind(), "bad_request");
}
