//! HTTP-level tests for device inventory and device-scoped warranties.

mod common;

use axum::http::StatusCode;
use axum::Router;
use chrono::{Duration, Utc};
use common::{
    body_json, build_test_app, create_user, delete_auth, get_auth, post_auth, post_json_auth,
    put_json_auth, user_with_token,
};
use inventory_core::roles::Role;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn device_body(serial: &str) -> serde_json::Value {
    serde_json::json!({
        "serial_number": serial,
        "manufacturer": "Lenovo",
        "model_name": "ThinkPad X1",
        "condition": "new",
        "location": "warehouse",
        "purchase_date": "2024-01-15",
    })
}

/// Create a device through the API and return its JSON.
async fn create_device(app: &Router, token: &str, serial: &str) -> serde_json::Value {
    let response =
        post_json_auth(app.clone(), "/api/v1/devices", device_body(serial), token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

fn warranty_body(code: &str, start: &str, end: &str) -> serde_json::Value {
    serde_json::json!({
        "warranty_code": code,
        "warranty_type": "extended",
        "start_date": start,
        "end_date": end,
        "description": "Next business day on-site",
    })
}

async fn device_count(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM devices")
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_starts_available(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;

    let device = create_device(&app, &admin, "SN-001").await;
    assert_eq!(device["status"], "available");
    assert_eq!(device["location"], "warehouse");
    assert!(device["assigned_user_id"].is_null());
    assert_eq!(device["purchase_date"], "2024-01-15");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_serial_conflicts_without_writing(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    create_device(&app, &admin, "SN-001").await;

    let mut body = device_body("SN-001");
    body["manufacturer"] = "Dell".into();
    let response = post_json_auth(app, "/api/v1/devices", body, &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(device_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_serial_is_a_validation_error(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;

    let response = post_json_auth(app, "/api/v1/devices", device_body("   "), &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn employee_cannot_manage_inventory(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, emp) = user_with_token(&app, &pool, "emp1", Role::Employee).await;

    let response = post_json_auth(app, "/api/v1/devices", device_body("SN-001"), &emp).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_filters_by_serial_and_status(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    create_device(&app, &admin, "LAP-100").await;
    create_device(&app, &admin, "LAP-200").await;
    create_device(&app, &admin, "PHN-300").await;

    let response = get_auth(app.clone(), "/api/v1/devices?serial_number=lap", &admin).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let response = get_auth(app, "/api/v1/devices?status=assigned", &admin).await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_keeps_status_and_rejects_taken_serial(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let device = create_device(&app, &admin, "SN-001").await;
    create_device(&app, &admin, "SN-002").await;
    let uri = format!("/api/v1/devices/{}", device["id"]);

    let response = put_json_auth(
        app.clone(),
        &uri,
        serde_json::json!({ "condition": "used", "status": "maintenance" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["condition"], "used");
    assert_eq!(json["data"]["status"], "available");

    let response =
        put_json_auth(app, &uri, serde_json::json!({ "serial_number": "SN-002" }), &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Assignment and status
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn assign_then_return_to_stock(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let emp = create_user(&pool, "emp1", Role::Employee).await;
    let device = create_device(&app, &admin, "SN-001").await;
    let id = &device["id"];

    let uri = format!("/api/v1/devices/{id}/assign/{}", emp.id);
    let response = post_auth(app.clone(), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "assigned");
    assert_eq!(json["data"]["location"], "with_employee");
    assert_eq!(json["data"]["assigned_user_id"], emp.id);

    let response = post_auth(app.clone(), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let status_uri = format!("/api/v1/devices/{id}/status");
    let response = put_json_auth(
        app.clone(),
        &status_uri,
        serde_json::json!({ "status": "available" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "available");
    assert_eq!(json["data"]["location"], "warehouse");
    assert!(json["data"]["assigned_user_id"].is_null());

    let response =
        put_json_auth(app, &status_uri, serde_json::json!({ "status": "assigned" }), &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn location_edits_respect_assignment(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let emp = create_user(&pool, "emp1", Role::Employee).await;

    let mut body = device_body("SN-NEW");
    body["location"] = serde_json::json!("with_employee");
    let response = post_json_auth(app.clone(), "/api/v1/devices", body, &admin).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let device = create_device(&app, &admin, "SN-001").await;
    let id = &device["id"];
    let uri = format!("/api/v1/devices/{id}");

    let response = put_json_auth(
        app.clone(),
        &uri,
        serde_json::json!({ "location": "office_hq" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["location"], "office_hq");

    let response =
        post_auth(app.clone(), &format!("/api/v1/devices/{id}/assign/{}", emp.id), &admin).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = put_json_auth(
        app.clone(),
        &uri,
        serde_json::json!({ "location": "warehouse" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(app, &uri, &admin).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "assigned");
    assert_eq!(json["data"]["location"], "with_employee");
    assert_eq!(json["data"]["assigned_user_id"], emp.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn assign_to_missing_user_is_not_found(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let device = create_device(&app, &admin, "SN-001").await;

    let uri = format!("/api/v1/devices/{}/assign/999999", device["id"]);
    let response = post_auth(app, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_is_refused_while_a_request_is_pending(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let (_, emp) = user_with_token(&app, &pool, "emp1", Role::Employee).await;
    let device = create_device(&app, &admin, "SN-001").await;
    let uri = format!("/api/v1/devices/{}", device["id"]);

    let response = post_json_auth(
        app.clone(),
        "/api/v1/device-requests",
        serde_json::json!({ "request_type": "device_assignment", "device_id": device["id"] }),
        &emp,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let request_id = body_json(response).await["data"]["id"].clone();

    let response = delete_auth(app.clone(), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response =
        delete_auth(app.clone(), &format!("/api/v1/device-requests/{request_id}"), &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(app.clone(), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Warranties
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn warranties_carry_derived_status(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let device = create_device(&app, &admin, "SN-001").await;
    let uri = format!("/api/v1/devices/{}/warranties", device["id"]);

    let today = Utc::now().date_naive();
    let future_start = (today + Duration::days(10)).to_string();
    let future_end = (today + Duration::days(400)).to_string();

    let response = post_json_auth(
        app.clone(),
        &uri,
        warranty_body("W-ACTIVE", "2020-01-01", "2099-12-31"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["status"], "active");

    post_json_auth(
        app.clone(),
        &uri,
        warranty_body("W-OLD", "2019-01-01", "2020-01-01"),
        &admin,
    )
    .await;
    post_json_auth(
        app.clone(),
        &uri,
        warranty_body("W-FUTURE", &future_start, &future_end),
        &admin,
    )
    .await;

    let response = get_auth(app, &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let statuses: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| (w["warranty_code"].as_str().unwrap(), w["status"].as_str().unwrap()))
        .collect();
    assert_eq!(
        statuses,
        [("W-OLD", "expired"), ("W-FUTURE", "pending"), ("W-ACTIVE", "active")]
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn warranty_period_and_code_are_validated(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let device = create_device(&app, &admin, "SN-001").await;
    let uri = format!("/api/v1/devices/{}/warranties", device["id"]);

    let response = post_json_auth(
        app.clone(),
        &uri,
        warranty_body("W-1", "2025-06-01", "2025-01-01"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json_auth(
        app.clone(),
        &uri,
        warranty_body("W-1", "2025-01-01", "2026-01-01"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json_auth(
        app,
        &uri,
        warranty_body("W-1", "2025-01-01", "2026-01-01"),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn warranty_on_another_device_is_not_owned(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let first = create_device(&app, &admin, "SN-001").await;
    let second = create_device(&app, &admin, "SN-002").await;

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/devices/{}/warranties", first["id"]),
        warranty_body("W-1", "2025-01-01", "2026-01-01"),
        &admin,
    )
    .await;
    let warranty_id = body_json(response).await["data"]["id"].clone();

    let wrong_uri = format!("/api/v1/devices/{}/warranties/{warranty_id}", second["id"]);
    let response = put_json_auth(
        app.clone(),
        &wrong_uri,
        serde_json::json!({ "description": "moved" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("does not belong to device"));

    let response = delete_auth(app.clone(), &wrong_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let missing_uri = format!("/api/v1/devices/{}/warranties/999999", first["id"]);
    let response = delete_auth(app.clone(), &missing_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("Warranty with id 999999"));

    let right_uri = format!("/api/v1/devices/{}/warranties/{warranty_id}", first["id"]);
    let response = put_json_auth(
        app.clone(),
        &right_uri,
        serde_json::json!({ "end_date": "2024-01-01" }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = delete_auth(app, &right_uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn employee_sees_warranties_of_own_device_only(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let (_, admin) = user_with_token(&app, &pool, "admin1", Role::Admin).await;
    let (emp, emp_token) = user_with_token(&app, &pool, "emp1", Role::Employee).await;
    let mine = create_device(&app, &admin, "SN-001").await;
    let theirs = create_device(&app, &admin, "SN-002").await;

    let response = post_auth(
        app.clone(),
        &format!("/api/v1/devices/{}/assign/{}", mine["id"], emp.id),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/devices/{}/warranties", mine["id"]),
        &emp_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        app,
        &format!("/api/v1/devices/{}/warranties", theirs["id"]),
        &emp_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
