use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Appointment;

/// Booking payload. Every field is optional on the wire so that missing
/// values surface as a 400 with a readable message instead of a body rejection.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    /// `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub appointment_date: Option<String>,
    /// `HH:MM`, `HH:MM:SS` or `HH:MM AM/PM`.
    pub appointment_time: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAppointmentStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DoctorScheduleQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppointmentList {
    pub items: Vec<Appointment>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookedSlots {
    #[serde(rename = "bookedSlots")]
    pub booked_slots: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AvailableSlots {
    #[serde(rename = "availableSlots")]
    pub available_slots: Vec<String>,
}
