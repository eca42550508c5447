use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        appointments::{
            AppointmentList, AvailableSlots, BookedSlots, CreateAppointmentRequest,
            UpdateAppointmentStatusRequest,
        },
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        clinics::{ClinicList, CreateClinicRequest},
        dashboard::{
            AppointmentsData, DailyCount, DashboardStats, MonthlyRevenue, RecentAppointments,
            RevenueData, StatusCount,
        },
        doctors::{CreateDoctorRequest, DoctorList},
        invoices::{CreateInvoiceRequest, InvoiceList, UpdateInvoiceStatusRequest},
        patients::{CreatePatientRequest, PatientList},
    },
    models::{Appointment, AppointmentStatus, Clinic, Doctor, Invoice, InvoiceStatus, Patient, Role, User},
    response::{ApiResponse, Meta},
    routes::{appointments, auth, clinics, dashboard, doctors, health, invoices, params, patients},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        appointments::create_appointment,
        appointments::get_appointment,
        appointments::booked_slots,
        appointments::available_slots,
        appointments::list_doctor_appointments,
        appointments::list_patient_appointments,
        appointments::update_appointment_status,
        dashboard::stats,
        dashboard::appointments_data,
        dashboard::revenue_data,
        dashboard::recent_appointments,
        clinics::create_clinic,
        clinics::list_clinics,
        clinics::get_clinic,
        doctors::create_doctor,
        doctors::list_doctors,
        doctors::get_doctor,
        patients::create_patient,
        patients::list_patients,
        patients::get_patient,
        invoices::create_invoice,
        invoices::list_invoices,
        invoices::update_invoice_status
    ),
    components(
        schemas(
            User,
            Role,
            Clinic,
            Doctor,
            Patient,
            Appointment,
            AppointmentStatus,
            Invoice,
            InvoiceStatus,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateAppointmentRequest,
            UpdateAppointmentStatusRequest,
            AppointmentList,
            BookedSlots,
            AvailableSlots,
            DashboardStats,
            DailyCount,
            StatusCount,
            AppointmentsData,
            MonthlyRevenue,
            RevenueData,
            RecentAppointments,
            CreateClinicRequest,
            ClinicList,
            CreateDoctorRequest,
            DoctorList,
            CreatePatientRequest,
            PatientList,
            CreateInvoiceRequest,
            UpdateInvoiceStatusRequest,
            InvoiceList,
            params::Pagination,
            params::DoctorQuery,
            params::PatientQuery,
            params::InvoiceQuery,
            Meta,
            ApiResponse<Appointment>,
            ApiResponse<AppointmentList>,
            ApiResponse<BookedSlots>,
            ApiResponse<DashboardStats>,
            ApiResponse<Invoice>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Appointments", description = "Booking, slots and status lifecycle"),
        (name = "Dashboard", description = "Aggregate stat widgets"),
        (name = "Clinics", description = "Clinic endpoints"),
        (name = "Doctors", description = "Doctor endpoints"),
        (name = "Patients", description = "Patient endpoints"),
        (name = "Invoices", description = "Billing endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_booking_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/appointments"));
        assert!(
            doc.paths
                .paths
                .contains_key("/api/appointments/booked-slots/{doctor_id}/{date}")
        );
        assert!(doc.paths.paths.contains_key("/api/dashboard/stats"));
    }
}
