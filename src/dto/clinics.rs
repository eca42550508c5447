use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Clinic;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateClinicRequest {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClinicList {
    pub items: Vec<Clinic>,
}
