use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::invoices::{CreateInvoiceRequest, InvoiceList, UpdateInvoiceStatusRequest},
    entity::{
        appointments::Entity as Appointments,
        invoices::{ActiveModel as InvoiceActive, Column as InvoiceCol, Entity as Invoices, Model as InvoiceModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, BILLING_STAFF, ensure_any_role, ensure_staff},
    models::{Invoice, InvoiceStatus},
    response::{ApiResponse, Meta},
    routes::params::{InvoiceQuery, SortOrder},
    state::AppState,
};

/// Status implied by how much of the total has been paid.
pub fn status_for_amounts(total: i64, paid: i64) -> InvoiceStatus {
    if paid <= 0 {
        InvoiceStatus::Pending
    } else if paid >= total {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::Partial
    }
}

pub fn validate_amounts(total: i64, paid: i64) -> AppResult<()> {
    if total < 0 || paid < 0 {
        return Err(AppError::BadRequest("amounts must not be negative".into()));
    }
    if paid > total {
        return Err(AppError::BadRequest(
            "paid_amount must not exceed total_amount".into(),
        ));
    }
    Ok(())
}

pub async fn create_invoice(
    state: &AppState,
    user: &AuthUser,
    payload: CreateInvoiceRequest,
) -> AppResult<ApiResponse<Invoice>> {
    ensure_any_role(user, &BILLING_STAFF)?;
    let paid_amount = payload.paid_amount.unwrap_or(0);
    validate_amounts(payload.total_amount, paid_amount)?;

    let mut clinic_id = payload.clinic_id;
    if let Some(appointment_id) = payload.appointment_id.as_ref() {
        let appointment = Appointments::find_by_id(appointment_id.clone())
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::BadRequest("appointment does not exist".into()))?;
        if appointment.patient_id != payload.patient_id {
            return Err(AppError::BadRequest(
                "appointment belongs to another patient".into(),
            ));
        }
        clinic_id = clinic_id.or(appointment.clinic_id);
    }

    let id = Uuid::new_v4();
    let invoice = InvoiceActive {
        id: Set(id),
        invoice_number: Set(build_invoice_number(id)),
        patient_id: Set(payload.patient_id),
        appointment_id: Set(payload.appointment_id),
        clinic_id: Set(clinic_id),
        total_amount: Set(payload.total_amount),
        paid_amount: Set(paid_amount),
        status: Set(status_for_amounts(payload.total_amount, paid_amount).as_str().to_string()),
        issued_at: Set(Utc::now().into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::InvoiceCreate,
        serde_json::json!({ "invoice_id": invoice.id, "total_amount": invoice.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Invoice created",
        invoice_from_entity(invoice)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_invoices(
    state: &AppState,
    user: &AuthUser,
    query: InvoiceQuery,
) -> AppResult<ApiResponse<InvoiceList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize()?;
    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = status.parse::<InvoiceStatus>().map_err(AppError::BadRequest)?;
        condition = condition.add(InvoiceCol::Status.eq(status.as_str()));
    }
    if let Some(patient_id) = query.patient_id {
        condition = condition.add(InvoiceCol::PatientId.eq(patient_id));
    }

    let mut finder = Invoices::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(InvoiceCol::IssuedAt),
        SortOrder::Desc => finder.order_by_desc(InvoiceCol::IssuedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(invoice_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Invoices",
        InvoiceList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_invoice_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateInvoiceStatusRequest,
) -> AppResult<ApiResponse<Invoice>> {
    ensure_any_role(user, &BILLING_STAFF)?;
    let status = payload
        .status
        .trim()
        .parse::<InvoiceStatus>()
        .map_err(AppError::BadRequest)?;

    let txn = state.orm.begin().await?;
    let invoice = Invoices::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let total_amount = invoice.total_amount;
    if status == InvoiceStatus::Partial
        && status_for_amounts(total_amount, invoice.paid_amount) != InvoiceStatus::Partial
    {
        return Err(AppError::Conflict(
            "invoice has no partial payment recorded".into(),
        ));
    }
    let mut active: InvoiceActive = invoice.into();
    active.status = Set(status.as_str().to_string());
    match status {
        InvoiceStatus::Paid => active.paid_amount = Set(total_amount),
        InvoiceStatus::Pending => active.paid_amount = Set(0),
        InvoiceStatus::Partial => {}
    }
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::InvoiceStatusUpdate,
        serde_json::json!({ "invoice_id": updated.id, "status": updated.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Invoice updated",
        invoice_from_entity(updated)?,
        Some(Meta::empty()),
    ))
}

fn invoice_from_entity(model: InvoiceModel) -> AppResult<Invoice> {
    let status = model
        .status
        .parse::<InvoiceStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(Invoice {
        id: model.id,
        invoice_number: model.invoice_number,
        patient_id: model.patient_id,
        appointment_id: model.appointment_id,
        clinic_id: model.clinic_id,
        total_amount: model.total_amount,
        paid_amount: model.paid_amount,
        status,
        issued_at: model.issued_at.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn build_invoice_number(invoice_id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = invoice_id.to_string();
    let short = &suffix[..8];
    format!("INV-{}-{}", date, short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_paid_amount() {
        assert_eq!(status_for_amounts(10_000, 0), InvoiceStatus::Pending);
        assert_eq!(status_for_amounts(10_000, 2_500), InvoiceStatus::Partial);
        assert_eq!(status_for_amounts(10_000, 10_000), InvoiceStatus::Paid);
        assert_eq!(status_for_amounts(0, 0), InvoiceStatus::Pending);
    }

    #[test]
    fn overpayment_and_negatives_are_rejected() {
        assert!(validate_amounts(100, 150).is_err());
        assert!(validate_amounts(-1, 0).is_err());
        assert!(validate_amounts(100, 100).is_ok());
    }

    #[test]
    fn invoice_numbers_embed_the_id_prefix() {
        let id = Uuid::new_v4();
        let number = build_invoice_number(id);
        assert!(number.starts_with("INV-"));
        assert!(number.ends_with(&id.to_string()[..8]));
        assert_eq!(number.len(), "INV-20260212-".len() + 8);
    }
}
