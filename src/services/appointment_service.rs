use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::appointments::{
        AppointmentList, AvailableSlots, BookedSlots, CreateAppointmentRequest,
        UpdateAppointmentStatusRequest,
    },
    entity::{
        appointments::{
            ActiveModel as AppointmentActive, Column as AptCol, Entity as Appointments,
            Model as AppointmentModel,
        },
        doctors::Entity as Doctors,
        patients::Entity as Patients,
    },
    error::{AppError, AppResult, DbErrorKind},
    middleware::auth::{APPOINTMENT_STAFF, AuthUser, ensure_any_role, ensure_staff},
    models::{Appointment, AppointmentStatus, Role},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{lifecycle, slots},
    state::AppState,
};

const MAX_ID_ATTEMPTS: usize = 3;
const APPOINTMENTS_PKEY: &str = "appointments_pkey";
const SLOT_TAKEN: &str = "slot already booked";

/// A booking request that passed field validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// `APT-YYMMDD-HHMM-RRRR`, timestamped in UTC with four random digits.
pub fn generate_appointment_id<R: RngCore>(now: DateTime<Utc>, rng: &mut R) -> String {
    format!(
        "APT-{}-{:04}",
        now.format("%y%m%d-%H%M"),
        rng.next_u32() % 10_000
    )
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_uuid(field: &str, value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| AppError::BadRequest(format!("{field} is not a valid id")))
}

pub fn validate_booking(
    payload: CreateAppointmentRequest,
    today: NaiveDate,
) -> AppResult<NewBooking> {
    let (Some(patient_id), Some(doctor_id), Some(appointment_date)) = (
        required(payload.patient_id),
        required(payload.doctor_id),
        required(payload.appointment_date),
    ) else {
        return Err(AppError::BadRequest(
            "patient_id, doctor_id and appointment_date are required".into(),
        ));
    };
    let appointment_time = required(payload.appointment_time)
        .ok_or_else(|| AppError::BadRequest("appointment_time is required".into()))?;

    let patient_id = parse_uuid("patient_id", &patient_id)?;
    let doctor_id = parse_uuid("doctor_id", &doctor_id)?;
    let appointment_date =
        slots::parse_appointment_date(&appointment_date).map_err(AppError::BadRequest)?;
    if appointment_date < today {
        return Err(AppError::BadRequest(
            "appointment_date must not be in the past".into(),
        ));
    }
    let appointment_time =
        slots::parse_slot_time(&appointment_time).map_err(AppError::BadRequest)?;
    if !slots::is_offered(appointment_time) {
        return Err(AppError::BadRequest(format!(
            "{} is not an offered slot",
            slots::format_slot(appointment_time)
        )));
    }

    Ok(NewBooking {
        patient_id,
        doctor_id,
        appointment_date,
        appointment_time,
        reason: required(payload.reason),
        notes: required(payload.notes),
    })
}

/// Staff see every patient; a `patient` caller only the record linked to their account.
pub async fn ensure_patient_access(
    orm: &DatabaseConnection,
    user: &AuthUser,
    patient_id: Uuid,
) -> AppResult<()> {
    if user.role.is_staff() {
        return Ok(());
    }
    let patient = Patients::find_by_id(patient_id)
        .one(orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if patient.user_id != Some(user.user_id) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn create_appointment(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAppointmentRequest,
    today: NaiveDate,
) -> AppResult<ApiResponse<Appointment>> {
    let booking = validate_booking(payload, today)?;
    if user.role == Role::Patient {
        ensure_patient_access(&state.orm, user, booking.patient_id).await?;
    }

    let doctor = Doctors::find_by_id(booking.doctor_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    for attempt in 1..=MAX_ID_ATTEMPTS {
        let appointment_id = generate_appointment_id(Utc::now(), &mut OsRng);
        match insert_booking(&state.orm, &booking, doctor.clinic_id, &appointment_id).await {
            Ok(model) => {
                tracing::info!(
                    appointment_id = %model.appointment_id,
                    doctor_id = %model.doctor_id,
                    date = %model.appointment_date,
                    time = %model.appointment_time,
                    "appointment booked"
                );
                audit::record(
                    &state.pool,
                    Some(user.user_id),
                    AuditAction::AppointmentCreate,
                    serde_json::json!({ "appointment_id": model.appointment_id }),
                )
                .await;
                return Ok(ApiResponse::success(
                    "Appointment created",
                    appointment_from_entity(model)?,
                    Some(Meta::empty()),
                ));
            }
            Err(err) if err.is_slot_violation() => {
                tracing::warn!(
                    doctor_id = %booking.doctor_id,
                    date = %booking.appointment_date,
                    time = %booking.appointment_time,
                    "concurrent booking lost the slot"
                );
                return Err(AppError::Conflict(SLOT_TAKEN.into()));
            }
            Err(err)
                if err.db_error_kind() == Some(DbErrorKind::UniqueViolation)
                    && err.constraint() == Some(APPOINTMENTS_PKEY) =>
            {
                tracing::warn!(%appointment_id, attempt, "appointment id collision, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique appointment id"
    )))
}

/// Slot pre-check and insert in one transaction. The partial unique index on
/// (doctor_id, appointment_date, appointment_time) catches bookings that race
/// past the pre-check.
async fn insert_booking(
    orm: &DatabaseConnection,
    booking: &NewBooking,
    clinic_id: Option<Uuid>,
    appointment_id: &str,
) -> AppResult<AppointmentModel> {
    let txn = orm.begin().await?;

    let taken = Appointments::find()
        .filter(
            Condition::all()
                .add(AptCol::DoctorId.eq(booking.doctor_id))
                .add(AptCol::AppointmentDate.eq(booking.appointment_date))
                .add(AptCol::AppointmentTime.eq(booking.appointment_time))
                .add(AptCol::Status.ne(AppointmentStatus::Cancelled.as_str())),
        )
        .count(&txn)
        .await?;
    if taken > 0 {
        tracing::warn!(
            doctor_id = %booking.doctor_id,
            date = %booking.appointment_date,
            time = %booking.appointment_time,
            "slot already booked"
        );
        return Err(AppError::Conflict(SLOT_TAKEN.into()));
    }

    let model = AppointmentActive {
        appointment_id: Set(appointment_id.to_string()),
        patient_id: Set(booking.patient_id),
        doctor_id: Set(booking.doctor_id),
        clinic_id: Set(clinic_id),
        appointment_date: Set(booking.appointment_date),
        appointment_time: Set(booking.appointment_time),
        reason: Set(booking.reason.clone()),
        notes: Set(booking.notes.clone()),
        status: Set(AppointmentStatus::Scheduled.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model)
}

pub async fn get_appointment(
    state: &AppState,
    user: &AuthUser,
    id: String,
) -> AppResult<ApiResponse<Appointment>> {
    let model = Appointments::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_patient_access(&state.orm, user, model.patient_id).await?;

    Ok(ApiResponse::success(
        "OK",
        appointment_from_entity(model)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_doctor_appointments(
    state: &AppState,
    user: &AuthUser,
    doctor_id: Uuid,
    date: Option<String>,
) -> AppResult<ApiResponse<AppointmentList>> {
    ensure_staff(user)?;
    let mut condition = Condition::all().add(AptCol::DoctorId.eq(doctor_id));
    if let Some(date) = date.as_deref().filter(|d| !d.trim().is_empty()) {
        let date = slots::parse_appointment_date(date).map_err(AppError::BadRequest)?;
        condition = condition.add(AptCol::AppointmentDate.eq(date));
    }

    let items = Appointments::find()
        .filter(condition)
        .order_by_asc(AptCol::AppointmentDate)
        .order_by_asc(AptCol::AppointmentTime)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(appointment_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Ok",
        AppointmentList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn list_patient_appointments(
    state: &AppState,
    user: &AuthUser,
    patient_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<AppointmentList>> {
    ensure_patient_access(&state.orm, user, patient_id).await?;
    let (page, limit, offset) = pagination.normalize()?;

    let finder = Appointments::find()
        .filter(AptCol::PatientId.eq(patient_id))
        .order_by_desc(AptCol::AppointmentDate)
        .order_by_desc(AptCol::AppointmentTime);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(appointment_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        AppointmentList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Times held by non-cancelled appointments. An unknown doctor simply has none.
async fn occupied_times(
    orm: &DatabaseConnection,
    doctor_id: Uuid,
    date: NaiveDate,
) -> AppResult<Vec<NaiveTime>> {
    let times = Appointments::find()
        .select_only()
        .column(AptCol::AppointmentTime)
        .filter(
            Condition::all()
                .add(AptCol::DoctorId.eq(doctor_id))
                .add(AptCol::AppointmentDate.eq(date))
                .add(AptCol::Status.ne(AppointmentStatus::Cancelled.as_str())),
        )
        .into_tuple::<NaiveTime>()
        .all(orm)
        .await?;
    Ok(times)
}

pub async fn booked_slots(
    state: &AppState,
    doctor_id: Uuid,
    date: &str,
) -> AppResult<ApiResponse<BookedSlots>> {
    let date = slots::parse_appointment_date(date).map_err(AppError::BadRequest)?;
    let times = occupied_times(&state.orm, doctor_id, date).await?;

    Ok(ApiResponse::success(
        "Booked slots",
        BookedSlots {
            booked_slots: slots::booked_slots(times),
        },
        Some(Meta::empty()),
    ))
}

pub async fn available_slots(
    state: &AppState,
    doctor_id: Uuid,
    date: &str,
) -> AppResult<ApiResponse<AvailableSlots>> {
    let date = slots::parse_appointment_date(date).map_err(AppError::BadRequest)?;
    let times = occupied_times(&state.orm, doctor_id, date).await?;

    Ok(ApiResponse::success(
        "Available slots",
        AvailableSlots {
            available_slots: slots::available_slots(&times),
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: String,
    payload: UpdateAppointmentStatusRequest,
) -> AppResult<ApiResponse<Appointment>> {
    ensure_any_role(user, &APPOINTMENT_STAFF)?;
    let next = payload
        .status
        .trim()
        .parse::<AppointmentStatus>()
        .map_err(AppError::BadRequest)?;

    let txn = state.orm.begin().await?;
    let existing = Appointments::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let current = parse_status(&existing.status)?;
    lifecycle::validate_transition(current, next)?;

    let mut active: AppointmentActive = existing.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        appointment_id = %updated.appointment_id,
        from = %current,
        to = %next,
        "appointment status updated"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::AppointmentStatusUpdate,
        serde_json::json!({
            "appointment_id": updated.appointment_id,
            "from": current.as_str(),
            "to": next.as_str(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Appointment updated",
        appointment_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

fn parse_status(raw: &str) -> AppResult<AppointmentStatus> {
    raw.parse::<AppointmentStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

pub fn appointment_from_entity(model: AppointmentModel) -> AppResult<Appointment> {
    Ok(Appointment {
        status: parse_status(&model.status)?,
        appointment_id: model.appointment_id,
        patient_id: model.patient_id,
        doctor_id: model.doctor_id,
        clinic_id: model.clinic_id,
        appointment_date: model.appointment_date,
        appointment_time: slots::format_slot(model.appointment_time),
        reason: model.reason,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Deterministic stand-in for `OsRng`.
    struct FixedRng(u32);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0
        }
        fn next_u64(&mut self) -> u64 {
            self.0 as u64
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), password_hash::rand_core::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    fn request() -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: Some(Uuid::new_v4().to_string()),
            doctor_id: Some(Uuid::new_v4().to_string()),
            appointment_date: Some("2026-02-12".into()),
            appointment_time: Some("10:00 AM".into()),
            reason: Some("  checkup ".into()),
            notes: Some("".into()),
        }
    }

    #[test]
    fn appointment_id_follows_the_documented_format() {
        let now = Utc.with_ymd_and_hms(2026, 2, 12, 9, 5, 0).unwrap();
        assert_eq!(
            generate_appointment_id(now, &mut FixedRng(123_456_789)),
            "APT-260212-0905-6789"
        );
        assert_eq!(
            generate_appointment_id(now, &mut FixedRng(42)),
            "APT-260212-0905-0042"
        );
    }

    #[test]
    fn random_ids_have_a_four_digit_suffix() {
        let id = generate_appointment_id(Utc::now(), &mut OsRng);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "APT");
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 4);
        assert_eq!(parts[3].len(), 4);
        assert!(parts[3].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn valid_request_is_normalized() {
        let booking = validate_booking(request(), today()).unwrap();
        assert_eq!(booking.appointment_date, NaiveDate::from_ymd_opt(2026, 2, 12).unwrap());
        assert_eq!(booking.appointment_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(booking.reason.as_deref(), Some("checkup"));
        assert_eq!(booking.notes, None);
    }

    #[test]
    fn each_required_field_is_enforced() {
        let cases: [fn(&mut CreateAppointmentRequest); 3] = [
            |r| r.patient_id = None,
            |r| r.doctor_id = Some("   ".into()),
            |r| r.appointment_date = None,
        ];
        for strip in cases {
            let mut req = request();
            strip(&mut req);
            assert!(matches!(
                validate_booking(req, today()),
                Err(AppError::BadRequest(msg)) if msg.contains("required")
            ));
        }
    }

    #[test]
    fn malformed_values_are_bad_requests() {
        let mut req = request();
        req.doctor_id = Some("3".into());
        assert!(matches!(validate_booking(req, today()), Err(AppError::BadRequest(_))));

        let mut req = request();
        req.appointment_date = Some("2026-02-09".into());
        assert!(matches!(validate_booking(req, today()), Err(AppError::BadRequest(_))));

        let mut req = request();
        req.appointment_time = Some("07:45".into());
        assert!(matches!(
            validate_booking(req, today()),
            Err(AppError::BadRequest(msg)) if msg.contains("not an offered slot")
        ));

        let mut req = request();
        req.appointment_time = None;
        assert!(validate_booking(req, today()).is_err());
    }

    #[test]
    fn legacy_time_formats_land_on_the_same_slot() {
        let mut a = request();
        a.appointment_time = Some("14:00:00".into());
        let mut b = request();
        b.appointment_time = Some("02:00 PM".into());
        assert_eq!(
            validate_booking(a, today()).unwrap().appointment_time,
            validate_booking(b, today()).unwrap().appointment_time
        );
    }
}
