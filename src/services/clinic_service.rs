use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    dto::clinics::{ClinicList, CreateClinicRequest},
    entity::clinics::{ActiveModel as ClinicActive, Column as ClinicCol, Entity as Clinics, Model as ClinicModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Clinic,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_clinic(
    state: &AppState,
    user: &AuthUser,
    payload: CreateClinicRequest,
) -> AppResult<ApiResponse<Clinic>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }

    let clinic = ClinicActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        address: Set(payload.address),
        phone: Set(payload.phone),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(clinic_id = %clinic.id, "clinic created");
    Ok(ApiResponse::success(
        "Clinic created",
        clinic_from_entity(clinic),
        Some(Meta::empty()),
    ))
}

pub async fn list_clinics(state: &AppState) -> AppResult<ApiResponse<ClinicList>> {
    let items: Vec<Clinic> = Clinics::find()
        .order_by_asc(ClinicCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(clinic_from_entity)
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Clinics",
        ClinicList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_clinic(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Clinic>> {
    let clinic = Clinics::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "OK",
        clinic_from_entity(clinic),
        Some(Meta::empty()),
    ))
}

fn clinic_from_entity(model: ClinicModel) -> Clinic {
    Clinic {
        id: model.id,
        name: model.name,
        address: model.address,
        phone: model.phone,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
