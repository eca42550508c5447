use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod appointments;
pub mod auth;
pub mod clinics;
pub mod dashboard;
pub mod doc;
pub mod doctors;
pub mod extract;
pub mod health;
pub mod invoices;
pub mod params;
pub mod patients;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/appointments", appointments::router())
        .nest("/dashboard", dashboard::router())
        .nest("/clinics", clinics::router())
        .nest("/doctors", doctors::router())
        .nest("/patients", patients::router())
        .nest("/invoices", invoices::router())
}

/// Full application: health, `/api`, docs and the JSON 404 fallback, with state bound.
/// Transport layers (tracing, request ids, limits) are added by the binary.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    tracing::debug!(path = %uri.path(), "no route matched");
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
