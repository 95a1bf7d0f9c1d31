mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use availability_cell::router::availability_routes;
use shared_database::{AppState, Database};
use shared_utils::test_utils::{test_app_config, JwtTestUtils, TestUser, TEST_JWT_SECRET};

fn create_test_app(db: &Database) -> Router {
    let state = Arc::new(AppState::new(test_app_config("sqlite::memory:"), db.clone()));
    availability_routes(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn bearer(user: &TestUser) -> String {
    format!("Bearer {}", JwtTestUtils::create_test_token(user, TEST_JWT_SECRET, None))
}

#[tokio::test]
async fn slot_listing_is_public() {
    let test_db = common::setup().await;
    let doctor_id = common::seed_doctor(&test_db.db).await;
    let app = create_test_app(&test_db.db);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}/availability?date=2030-01-07", doctor_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn malformed_date_is_a_bad_request() {
    let test_db = common::setup().await;
    let doctor_id = common::seed_doctor(&test_db.db).await;
    let app = create_test_app(&test_db.db);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}/availability?date=07-01-2030", doctor_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schedule_management_requires_a_doctor_token() {
    let test_db = common::setup().await;
    common::seed_doctor(&test_db.db).await;
    let app = create_test_app(&test_db.db);

    // No token at all
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/me/availability").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A patient token is authenticated but not allowed
    let patient = TestUser::patient("pat@mail.test");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/me/availability")
                .header("Authorization", bearer(&patient))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn doctor_saves_and_reads_their_week_over_http() {
    let test_db = common::setup().await;
    let doctor_id = common::seed_doctor(&test_db.db).await;
    let app = create_test_app(&test_db.db);
    let doctor = TestUser::with_id(doctor_id, "doc@clinic.test", "doctor");

    let payload = json!([
        { "weekday": 1, "start_time": "09:00", "end_time": "17:00", "slot_minutes": 30, "is_active": true },
        { "weekday": 2, "start_time": "10:00", "end_time": "14:00", "slot_minutes": 20, "is_active": true }
    ]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/me/availability")
                .header("Authorization", bearer(&doctor))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "ok": true }));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/me/availability")
                .header("Authorization", bearer(&doctor))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let week = body_json(response).await;
    let rows = week.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["weekday"], 1);
    assert_eq!(rows[1]["weekday"], 2);
    assert_eq!(rows[1]["slot_minutes"], 20);

    // The saved week now drives the public slot listing
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}/availability?date=2030-01-07", doctor_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let slots = body_json(response).await;
    assert_eq!(slots.as_array().unwrap().len(), 16);
    assert_eq!(slots[0], "09:00");
}

#[tokio::test]
async fn invalid_rule_payload_is_rejected() {
    let test_db = common::setup().await;
    let doctor_id = common::seed_doctor(&test_db.db).await;
    let app = create_test_app(&test_db.db);
    let doctor = TestUser::with_id(doctor_id, "doc@clinic.test", "doctor");

    let payload = json!([
        { "weekday": 9, "start_time": "09:00", "end_time": "17:00" }
    ]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/me/availability")
                .header("Authorization", bearer(&doctor))
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tampered_tokens_are_rejected() {
    let test_db = common::setup().await;
    common::seed_doctor(&test_db.db).await;
    let app = create_test_app(&test_db.db);

    let doctor = TestUser::with_id(Uuid::new_v4(), "doc@clinic.test", "doctor");
    let token = JwtTestUtils::create_invalid_signature_token(&doctor);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/me/availability")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
