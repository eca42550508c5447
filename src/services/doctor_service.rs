use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    dto::doctors::{CreateDoctorRequest, DoctorList},
    entity::doctors::{ActiveModel as DoctorActive, Column as DoctorCol, Entity as Doctors, Model as DoctorModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Doctor,
    response::{ApiResponse, Meta},
    routes::params::DoctorQuery,
    state::AppState,
};

pub async fn create_doctor(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDoctorRequest,
) -> AppResult<ApiResponse<Doctor>> {
    ensure_admin(user)?;
    let full_name = payload.full_name.trim().to_string();
    let specialization = payload.specialization.trim().to_string();
    if full_name.is_empty() || specialization.is_empty() {
        return Err(AppError::BadRequest(
            "full_name and specialization are required".into(),
        ));
    }

    let doctor = DoctorActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(payload.user_id),
        clinic_id: Set(payload.clinic_id),
        full_name: Set(full_name),
        specialization: Set(specialization),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(doctor_id = %doctor.id, "doctor onboarded");
    Ok(ApiResponse::success(
        "Doctor created",
        doctor_from_entity(doctor),
        Some(Meta::empty()),
    ))
}

pub async fn list_doctors(
    state: &AppState,
    query: DoctorQuery,
) -> AppResult<ApiResponse<DoctorList>> {
    let (page, limit, offset) = query.pagination().normalize()?;
    let mut condition = Condition::all();
    if let Some(clinic_id) = query.clinic_id {
        condition = condition.add(DoctorCol::ClinicId.eq(clinic_id));
    }
    if let Some(specialization) = query.specialization.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(DoctorCol::Specialization).ilike(format!("%{}%", specialization)));
    }

    let finder = Doctors::find()
        .filter(condition)
        .order_by_asc(DoctorCol::FullName);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(doctor_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Doctors",
        DoctorList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_doctor(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Doctor>> {
    let doctor = Doctors::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "OK",
        doctor_from_entity(doctor),
        Some(Meta::empty()),
    ))
}

fn doctor_from_entity(model: DoctorModel) -> Doctor {
    Doctor {
        id: model.id,
        user_id: model.user_id,
        clinic_id: model.clinic_id,
        full_name: model.full_name,
        specialization: model.specialization,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
