use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::patients::{CreatePatientRequest, PatientList},
    entity::patients::{ActiveModel as PatientActive, Column as PatientCol, Entity as Patients, Model as PatientModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Patient, Role},
    response::{ApiResponse, Meta},
    routes::params::PatientQuery,
    services::appointment_service::ensure_patient_access,
    state::AppState,
};

pub async fn create_patient(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePatientRequest,
) -> AppResult<ApiResponse<Patient>> {
    let full_name = payload.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::BadRequest("full_name is required".into()));
    }
    // patients can only register themselves
    let user_id = match user.role {
        Role::Patient => Some(user.user_id),
        _ => payload.user_id,
    };

    let patient = PatientActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        clinic_id: Set(payload.clinic_id),
        full_name: Set(full_name),
        date_of_birth: Set(payload.date_of_birth),
        phone: Set(payload.phone),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::PatientCreate,
        serde_json::json!({ "patient_id": patient.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Patient created",
        patient_from_entity(patient),
        Some(Meta::empty()),
    ))
}

pub async fn get_patient(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Patient>> {
    ensure_patient_access(&state.orm, user, id).await?;
    let patient = Patients::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "OK",
        patient_from_entity(patient),
        Some(Meta::empty()),
    ))
}

pub async fn list_patients(
    state: &AppState,
    user: &AuthUser,
    query: PatientQuery,
) -> AppResult<ApiResponse<PatientList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize()?;
    let mut condition = Condition::all();
    if let Some(clinic_id) = query.clinic_id {
        condition = condition.add(PatientCol::ClinicId.eq(clinic_id));
    }

    let finder = Patients::find()
        .filter(condition)
        .order_by_desc(PatientCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(patient_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Patients",
        PatientList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

fn patient_from_entity(model: PatientModel) -> Patient {
    Patient {
        id: model.id,
        user_id: model.user_id,
        clinic_id: model.clinic_id,
        full_name: model.full_name,
        date_of_birth: model.date_of_birth,
        phone: model.phone,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
