use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Patient;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePatientRequest {
    /// Ignored for `patient` callers, whose own account is always linked.
    pub user_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientList {
    pub items: Vec<Patient>,
}
