use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Invoice;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    pub patient_id: Uuid,
    pub appointment_id: Option<String>,
    pub clinic_id: Option<Uuid>,
    pub total_amount: i64,
    pub paid_amount: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateInvoiceStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InvoiceList {
    pub items: Vec<Invoice>,
}
