use crate::{
    error::{AppError, AppResult},
    models::AppointmentStatus,
};

/// Allow-list of status changes. Terminal states have no outgoing edges.
pub fn allowed_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    match from {
        AppointmentStatus::Scheduled => &[
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ],
        AppointmentStatus::Completed
        | AppointmentStatus::Cancelled
        | AppointmentStatus::NoShow => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

pub fn is_terminal(status: AppointmentStatus) -> bool {
    allowed_transitions(status).is_empty()
}

pub fn validate_transition(from: AppointmentStatus, to: AppointmentStatus) -> AppResult<()> {
    if can_transition(from, to) {
        return Ok(());
    }
    tracing::warn!(%from, %to, "rejected appointment status transition");
    if is_terminal(from) {
        return Err(AppError::Conflict(format!(
            "appointment is already {from} and can no longer change"
        )));
    }
    Err(AppError::Conflict(format!(
        "cannot change appointment status from {from} to {to}"
    )))
}
