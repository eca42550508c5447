mod common;

use axum::http::StatusCode;
use clinic_booking_api::{models::Role, routes::create_app};
use serde_json::json;
use tower::ServiceExt;

use common::{bearer, body_json, get_request, json_request, offline_state};

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let app = create_app(offline_state());
    let response = app.oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["database"], "down");
}

#[tokio::test]
async fn booking_requires_a_bearer_token() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(json_request("POST", "/api/appointments", None, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn forged_tokens_are_rejected() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request(
            "/api/dashboard/stats",
            Some("Bearer not.a.jwt"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["error"], "Unauthorized: Invalid token");
}

#[tokio::test]
async fn booking_without_required_fields_is_a_bad_request() {
    let token = bearer(Role::Receptionist);
    for body in [
        json!({ "doctor_id": "0b0f7a5e-6f43-4d2c-9d0a-111111111111", "appointment_date": "2030-01-01", "appointment_time": "10:00 AM" }),
        json!({ "patient_id": "0b0f7a5e-6f43-4d2c-9d0a-222222222222", "appointment_date": "2030-01-01", "appointment_time": "10:00 AM" }),
        json!({ "patient_id": "0b0f7a5e-6f43-4d2c-9d0a-222222222222", "doctor_id": "0b0f7a5e-6f43-4d2c-9d0a-111111111111", "appointment_time": "10:00 AM" }),
    ] {
        let app = create_app(offline_state());
        let response = app
            .oneshot(json_request("POST", "/api/appointments", Some(&token), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(
            body["message"]
                .as_str()
                .unwrap_or_default()
                .contains("required")
        );
    }
}

#[tokio::test]
async fn status_update_by_patient_is_forbidden() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/appointments/APT-260212-1000-0042/status",
            Some(&bearer(Role::Patient)),
            json!({ "status": "cancelled" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_status_is_rejected_before_lookup() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/appointments/APT-260212-1000-0042/status",
            Some(&bearer(Role::Doctor)),
            json!({ "status": "archived" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn assert_enveloped_bad_request(response: axum::http::Response<axum::body::Body>) {
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    let body = body_json(response).await;
    assert!(
        body["data"]["error"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Bad Request: ")
    );
}

#[tokio::test]
async fn booked_slots_validate_path_parameters() {
    let token = bearer(Role::Receptionist);

    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request(
            "/api/appointments/booked-slots/3/2026-02-12",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_enveloped_bad_request(response).await;

    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request(
            "/api/appointments/booked-slots/0b0f7a5e-6f43-4d2c-9d0a-111111111111/12-02-2026",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_enveloped_bad_request(response).await;
}

#[tokio::test]
async fn status_body_without_status_is_an_enveloped_bad_request() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/appointments/APT-260212-1000-0042/status",
            Some(&bearer(Role::Doctor)),
            json!({ "state": "completed" }),
        ))
        .await
        .unwrap();
    assert_enveloped_bad_request(response).await;
}

#[tokio::test]
async fn malformed_query_strings_use_the_envelope() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request(
            "/api/dashboard/stats?doctor_id=not-a-uuid",
            Some(&bearer(Role::Admin)),
        ))
        .await
        .unwrap();
    assert_enveloped_bad_request(response).await;
}

#[tokio::test]
async fn out_of_range_page_is_rejected_before_querying() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request(
            "/api/appointments/patient/0b0f7a5e-6f43-4d2c-9d0a-222222222222?page=9223372036854775807&per_page=100",
            Some(&bearer(Role::Receptionist)),
        ))
        .await
        .unwrap();
    assert_enveloped_bad_request(response).await;
}

#[tokio::test]
async fn dashboard_is_staff_only() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request(
            "/api/dashboard/stats",
            Some(&bearer(Role::Patient)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invoices_require_billing_staff() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/invoices",
            Some(&bearer(Role::Doctor)),
            json!({
                "patient_id": "0b0f7a5e-6f43-4d2c-9d0a-222222222222",
                "total_amount": 5000
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn database_failures_surface_as_server_errors() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request(
            "/api/clinics",
            Some(&bearer(Role::Admin)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "ORM error");
}

#[tokio::test]
async fn unknown_routes_return_json_not_found() {
    let app = create_app(offline_state());
    let response = app
        .oneshot(get_request("/api/nowhere", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["data"]["path"], "/api/nowhere");
}
