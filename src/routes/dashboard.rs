use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::dashboard::{
        AppointmentsData, DashboardQuery, DashboardStats, RecentAppointments, RevenueData,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::extract::ApiQuery,
    services::{dashboard_service, slots::local_today},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(stats))
        .route("/appointments-data", get(appointments_data))
        .route("/revenue-data", get(revenue_data))
        .route("/recent-appointments", get(recent_appointments))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    params(
        ("doctor_id" = Option<Uuid>, Query, description = "Only this doctor"),
        ("clinic_id" = Option<Uuid>, Query, description = "Only this clinic"),
    ),
    responses(
        (status = 200, description = "Stat widgets", body = ApiResponse<DashboardStats>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let resp = dashboard_service::stats(&state, &user, query, local_today()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/appointments-data",
    params(
        ("doctor_id" = Option<Uuid>, Query, description = "Only this doctor"),
        ("clinic_id" = Option<Uuid>, Query, description = "Only this clinic"),
    ),
    responses(
        (status = 200, description = "Appointments per day and status", body = ApiResponse<AppointmentsData>),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn appointments_data(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> AppResult<Json<ApiResponse<AppointmentsData>>> {
    let resp = dashboard_service::appointments_data(&state, &user, query, local_today()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/revenue-data",
    params(
        ("doctor_id" = Option<Uuid>, Query, description = "Only this doctor"),
        ("clinic_id" = Option<Uuid>, Query, description = "Only this clinic"),
    ),
    responses(
        (status = 200, description = "Invoice totals per month", body = ApiResponse<RevenueData>),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn revenue_data(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> AppResult<Json<ApiResponse<RevenueData>>> {
    let resp = dashboard_service::revenue_data(&state, &user, query, local_today()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/recent-appointments",
    params(
        ("doctor_id" = Option<Uuid>, Query, description = "Only this doctor"),
        ("clinic_id" = Option<Uuid>, Query, description = "Only this clinic"),
    ),
    responses(
        (status = 200, description = "Five latest bookings", body = ApiResponse<RecentAppointments>),
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn recent_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> AppResult<Json<ApiResponse<RecentAppointments>>> {
    let resp = dashboard_service::recent_appointments(&state, &user, query).await?;
    Ok(Json(resp))
}
