use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::patients::{CreatePatientRequest, PatientList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Patient,
    response::ApiResponse,
    routes::{extract::{ApiJson, ApiPath, ApiQuery}, params::PatientQuery},
    services::patient_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_patients).post(create_patient))
        .route("/{id}", get(get_patient))
}

#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient registered", body = ApiResponse<Patient>),
        (status = 400, description = "Invalid input or account already linked"),
    ),
    security(("bearer_auth" = [])),
    tag = "Patients"
)]
pub async fn create_patient(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreatePatientRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Patient>>)> {
    let resp = patient_service::create_patient(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/patients",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("clinic_id" = Option<Uuid>, Query, description = "Filter by clinic"),
    ),
    responses(
        (status = 200, description = "Patients", body = ApiResponse<PatientList>),
        (status = 403, description = "Staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Patients"
)]
pub async fn list_patients(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> AppResult<Json<ApiResponse<PatientList>>> {
    let resp = patient_service::list_patients(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = Uuid, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient", body = ApiResponse<Patient>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Patients"
)]
pub async fn get_patient(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Patient>>> {
    let resp = patient_service::get_patient(&state, &user, id).await?;
    Ok(Json(resp))
}
