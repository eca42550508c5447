use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::invoices::{CreateInvoiceRequest, InvoiceList, UpdateInvoiceStatusRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Invoice,
    response::ApiResponse,
    routes::{extract::{ApiJson, ApiPath, ApiQuery}, params::InvoiceQuery},
    services::invoice_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/{id}/status", patch(update_invoice_status))
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice issued", body = ApiResponse<Invoice>),
        (status = 400, description = "Invalid amounts or references"),
        (status = 403, description = "Billing staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateInvoiceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Invoice>>)> {
    let resp = invoice_service::create_invoice(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/invoices",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Paid, Pending or Partial"),
        ("patient_id" = Option<Uuid>, Query, description = "Filter by patient"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Invoices", body = ApiResponse<InvoiceList>),
        (status = 403, description = "Staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<InvoiceQuery>,
) -> AppResult<Json<ApiResponse<InvoiceList>>> {
    let resp = invoice_service::list_invoices(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/invoices/{id}/status",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    request_body = UpdateInvoiceStatusRequest,
    responses(
        (status = 200, description = "Invoice updated", body = ApiResponse<Invoice>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Billing staff only"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn update_invoice_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateInvoiceStatusRequest>,
) -> AppResult<Json<ApiResponse<Invoice>>> {
    let resp = invoice_service::update_invoice_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
