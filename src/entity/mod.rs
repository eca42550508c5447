pub mod appointments;
pub mod audit_logs;
pub mod clinics;
pub mod doctors;
pub mod invoices;
pub mod patients;
pub mod users;

pub use appointments::Entity as Appointments;
pub use audit_logs::Entity as AuditLogs;
pub use clinics::Entity as Clinics;
pub use doctors::Entity as Doctors;
pub use invoices::Entity as Invoices;
pub use patients::Entity as Patients;
pub use users::Entity as Users;
