use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Appointment, AppointmentStatus};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DashboardQuery {
    pub doctor_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub todays_appointments: i64,
    pub active_patients: i64,
    pub weekly_revenue: i64,
    pub pending_invoices: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct StatusCount {
    pub status: AppointmentStatus,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AppointmentsData {
    pub daily: Vec<DailyCount>,
    pub by_status: Vec<StatusCount>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub total: i64,
    pub paid: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevenueData {
    pub months: Vec<MonthlyRevenue>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecentAppointments {
    pub items: Vec<Appointment>,
}
