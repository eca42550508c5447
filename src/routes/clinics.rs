use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::clinics::{ClinicList, CreateClinicRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Clinic,
    response::ApiResponse,
    routes::extract::{ApiJson, ApiPath},
    services::clinic_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clinics).post(create_clinic))
        .route("/{id}", get(get_clinic))
}

#[utoipa::path(
    post,
    path = "/api/clinics",
    request_body = CreateClinicRequest,
    responses(
        (status = 201, description = "Clinic created", body = ApiResponse<Clinic>),
        (status = 400, description = "Invalid input or duplicate name"),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Clinics"
)]
pub async fn create_clinic(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateClinicRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Clinic>>)> {
    let resp = clinic_service::create_clinic(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/clinics",
    responses((status = 200, description = "All clinics", body = ApiResponse<ClinicList>)),
    security(("bearer_auth" = [])),
    tag = "Clinics"
)]
pub async fn list_clinics(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<ApiResponse<ClinicList>>> {
    let resp = clinic_service::list_clinics(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/clinics/{id}",
    params(("id" = Uuid, Path, description = "Clinic ID")),
    responses(
        (status = 200, description = "Clinic", body = ApiResponse<Clinic>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Clinics"
)]
pub async fn get_clinic(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Clinic>>> {
    let resp = clinic_service::get_clinic(&state, id).await?;
    Ok(Json(resp))
}
