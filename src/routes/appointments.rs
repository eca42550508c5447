use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::appointments::{
        AppointmentList, AvailableSlots, BookedSlots, CreateAppointmentRequest,
        DoctorScheduleQuery, UpdateAppointmentStatusRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Appointment,
    response::ApiResponse,
    routes::{extract::{ApiJson, ApiPath, ApiQuery}, params::Pagination},
    services::{appointment_service, slots::local_today},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_appointment))
        .route("/booked-slots/{doctor_id}/{date}", get(booked_slots))
        .route("/available-slots/{doctor_id}/{date}", get(available_slots))
        .route("/doctor/{doctor_id}", get(list_doctor_appointments))
        .route("/patient/{patient_id}", get(list_patient_appointments))
        .route("/{id}", get(get_appointment))
        .route("/{id}/status", patch(update_appointment_status))
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = ApiResponse<Appointment>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Booking for another patient"),
        (status = 404, description = "Doctor not found"),
        (status = 409, description = "Slot already booked"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    let resp = appointment_service::create_appointment(&state, &user, payload, local_today()).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(("id" = String, Path, description = "Appointment ID, e.g. APT-260212-1000-0042")),
    responses(
        (status = 200, description = "Appointment", body = ApiResponse<Appointment>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::get_appointment(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/booked-slots/{doctor_id}/{date}",
    params(
        ("doctor_id" = Uuid, Path, description = "Doctor ID"),
        ("date" = String, Path, description = "Date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Occupied slots", body = ApiResponse<BookedSlots>),
        (status = 400, description = "Invalid date"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn booked_slots(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath((doctor_id, date)): ApiPath<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<BookedSlots>>> {
    let resp = appointment_service::booked_slots(&state, doctor_id, &date).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/available-slots/{doctor_id}/{date}",
    params(
        ("doctor_id" = Uuid, Path, description = "Doctor ID"),
        ("date" = String, Path, description = "Date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Free slots", body = ApiResponse<AvailableSlots>),
        (status = 400, description = "Invalid date"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn available_slots(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath((doctor_id, date)): ApiPath<(Uuid, String)>,
) -> AppResult<Json<ApiResponse<AvailableSlots>>> {
    let resp = appointment_service::available_slots(&state, doctor_id, &date).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/doctor/{doctor_id}",
    params(
        ("doctor_id" = Uuid, Path, description = "Doctor ID"),
        ("date" = Option<String>, Query, description = "Only this date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Doctor schedule", body = ApiResponse<AppointmentList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn list_doctor_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(doctor_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<DoctorScheduleQuery>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    let resp =
        appointment_service::list_doctor_appointments(&state, &user, doctor_id, query.date).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/appointments/patient/{patient_id}",
    params(
        ("patient_id" = Uuid, Path, description = "Patient ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Patient appointments", body = ApiResponse<AppointmentList>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Patient not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn list_patient_appointments(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(patient_id): ApiPath<Uuid>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> AppResult<Json<ApiResponse<AppointmentList>>> {
    let resp =
        appointment_service::list_patient_appointments(&state, &user, patient_id, pagination)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/status",
    params(("id" = String, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Appointment>),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Role not allowed"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Illegal transition"),
    ),
    security(("bearer_auth" = [])),
    tag = "Appointments"
)]
pub async fn update_appointment_status(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateAppointmentStatusRequest>,
) -> AppResult<Json<ApiResponse<Appointment>>> {
    let resp = appointment_service::update_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
