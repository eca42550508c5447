pub mod appointments;
pub mod auth;
pub mod clinics;
pub mod dashboard;
pub mod doctors;
pub mod invoices;
pub mod patients;
