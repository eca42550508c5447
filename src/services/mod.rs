pub mod appointment_service;
pub mod auth_service;
pub mod clinic_service;
pub mod dashboard_service;
pub mod doctor_service;
pub mod invoice_service;
pub mod lifecycle;
pub mod patient_service;
pub mod slots;
