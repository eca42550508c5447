use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Doctor;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDoctorRequest {
    pub user_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub full_name: String,
    pub specialization: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DoctorList {
    pub items: Vec<Doctor>,
}
