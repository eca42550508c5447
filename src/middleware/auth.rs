use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{error::AppError, models::Role, services::auth_service::decode_token, state::AppState};

/// Roles allowed to move an appointment through its lifecycle.
pub const APPOINTMENT_STAFF: [Role; 3] = [Role::Admin, Role::Doctor, Role::Receptionist];

/// Roles allowed to manage billing records.
pub const BILLING_STAFF: [Role; 2] = [Role::Admin, Role::Receptionist];

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn ensure_any_role(user: &AuthUser, roles: &[Role]) -> Result<(), AppError> {
    if !roles.contains(&user.role) {
        tracing::debug!(user_id = %user.user_id, role = %user.role, "role check failed");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    ensure_any_role(user, &[role])
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let claims = decode_token(&state.auth, token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| AppError::Unauthorized("Invalid role in token".into()))?;

        Ok(AuthUser { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn appointment_staff_excludes_patients() {
        assert!(ensure_any_role(&user(Role::Admin), &APPOINTMENT_STAFF).is_ok());
        assert!(ensure_any_role(&user(Role::Doctor), &APPOINTMENT_STAFF).is_ok());
        assert!(ensure_any_role(&user(Role::Receptionist), &APPOINTMENT_STAFF).is_ok());
        assert!(matches!(
            ensure_any_role(&user(Role::Patient), &APPOINTMENT_STAFF),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn only_admin_passes_admin_check() {
        assert!(ensure_admin(&user(Role::Admin)).is_ok());
        assert!(ensure_admin(&user(Role::Receptionist)).is_err());
    }
}
