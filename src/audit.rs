use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Actions written to `audit_logs`. The resource column is implied by the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    PatientCreate,
    AppointmentCreate,
    AppointmentStatusUpdate,
    InvoiceCreate,
    InvoiceStatusUpdate,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::PatientCreate => "patient_create",
            AuditAction::AppointmentCreate => "appointment_create",
            AuditAction::AppointmentStatusUpdate => "appointment_status_update",
            AuditAction::InvoiceCreate => "invoice_create",
            AuditAction::InvoiceStatusUpdate => "invoice_status_update",
        }
    }

    pub fn resource(&self) -> &'static str {
        match self {
            AuditAction::UserRegister | AuditAction::UserLogin => "users",
            AuditAction::PatientCreate => "patients",
            AuditAction::AppointmentCreate | AuditAction::AppointmentStatusUpdate => {
                "appointments"
            }
            AuditAction::InvoiceCreate | AuditAction::InvoiceStatusUpdate => "invoices",
        }
    }
}

pub async fn insert_audit_log(
    pool: &DbPool,
    actor: Option<Uuid>,
    action: AuditAction,
    metadata: &Value,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO audit_logs (id, user_id, action, resource, metadata) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(action.as_str())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;
    Ok(())
}

/// Audit writes never fail the request that triggered them.
pub async fn record(pool: &DbPool, actor: Option<Uuid>, action: AuditAction, metadata: Value) {
    if let Err(err) = insert_audit_log(pool, actor, action, &metadata).await {
        tracing::warn!(error = %err, action = action.as_str(), "audit log failed");
    }
}
