use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::doctors::{CreateDoctorRequest, DoctorList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Doctor,
    response::ApiResponse,
    routes::{extract::{ApiJson, ApiPath, ApiQuery}, params::DoctorQuery},
    services::doctor_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_doctors).post(create_doctor))
        .route("/{id}", get(get_doctor))
}

#[utoipa::path(
    post,
    path = "/api/doctors",
    request_body = CreateDoctorRequest,
    responses(
        (status = 201, description = "Doctor onboarded", body = ApiResponse<Doctor>),
        (status = 400, description = "Invalid input or unknown clinic/user"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Doctors"
)]
pub async fn create_doctor(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateDoctorRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Doctor>>)> {
    let resp = doctor_service::create_doctor(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/doctors",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("clinic_id" = Option<Uuid>, Query, description = "Filter by clinic"),
        ("specialization" = Option<String>, Query, description = "Case-insensitive substring match"),
    ),
    responses((status = 200, description = "Doctors", body = ApiResponse<DoctorList>)),
    security(("bearer_auth" = [])),
    tag = "Doctors"
)]
pub async fn list_doctors(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(query): ApiQuery<DoctorQuery>,
) -> AppResult<Json<ApiResponse<DoctorList>>> {
    let resp = doctor_service::list_doctors(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/doctors/{id}",
    params(("id" = Uuid, Path, description = "Doctor ID")),
    responses(
        (status = 200, description = "Doctor", body = ApiResponse<Doctor>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Doctors"
)]
pub async fn get_doctor(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Doctor>>> {
    let resp = doctor_service::get_doctor(&state, id).await?;
    Ok(Json(resp))
}
