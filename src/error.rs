use std::borrow::Borrow;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, RuntimeErr};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

/// Partial unique index guarding a doctor's slot against double booking.
pub const SLOT_CONSTRAINT: &str = "appointments_doctor_slot_key";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// PostgreSQL error classes the API turns into client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    UniqueViolation,
    ForeignKeyViolation,
    InvalidInput,
    Other,
}

impl DbErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "23505" => DbErrorKind::UniqueViolation,
            "23503" => DbErrorKind::ForeignKeyViolation,
            // invalid_text_representation, invalid_datetime_format, datetime_field_overflow
            "22P02" | "22007" | "22008" => DbErrorKind::InvalidInput,
            _ => DbErrorKind::Other,
        }
    }
}

fn as_sqlx<E: Borrow<sqlx::Error>>(err: &E) -> &sqlx::Error {
    err.borrow()
}

fn database_error(err: &sqlx::Error) -> Option<&(dyn sqlx::error::DatabaseError + 'static)> {
    match err {
        sqlx::Error::Database(db_err) => Some(db_err.as_ref()),
        _ => None,
    }
}

impl AppError {
    fn sqlx_source(&self) -> Option<&sqlx::Error> {
        match self {
            AppError::DbError(err) => Some(err),
            AppError::OrmError(
                DbErr::Exec(RuntimeErr::SqlxError(err))
                | DbErr::Query(RuntimeErr::SqlxError(err))
                | DbErr::Conn(RuntimeErr::SqlxError(err)),
            ) => Some(as_sqlx(err)),
            _ => None,
        }
    }

    /// Classification of the underlying PostgreSQL error, if there is one.
    pub fn db_error_kind(&self) -> Option<DbErrorKind> {
        let db_err = database_error(self.sqlx_source()?)?;
        Some(
            db_err
                .code()
                .map(|code| DbErrorKind::from_code(&code))
                .unwrap_or(DbErrorKind::Other),
        )
    }

    /// Name of the violated constraint, when the database reported one.
    pub fn constraint(&self) -> Option<&str> {
        database_error(self.sqlx_source()?)?.constraint()
    }

    pub fn is_slot_violation(&self) -> bool {
        self.db_error_kind() == Some(DbErrorKind::UniqueViolation)
            && self.constraint() == Some(SLOT_CONSTRAINT)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DbError(_) | AppError::OrmError(_) => match self.db_error_kind() {
                Some(DbErrorKind::UniqueViolation) if self.is_slot_violation() => {
                    StatusCode::CONFLICT
                }
                Some(DbErrorKind::UniqueViolation)
                | Some(DbErrorKind::ForeignKeyViolation)
                | Some(DbErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self.db_error_kind() {
            Some(DbErrorKind::UniqueViolation) if self.is_slot_violation() => {
                "Conflict: slot already booked".to_string()
            }
            Some(DbErrorKind::UniqueViolation) => "Duplicate record".to_string(),
            Some(DbErrorKind::ForeignKeyViolation) => {
                "Referenced record does not exist".to_string()
            }
            Some(DbErrorKind::InvalidInput) => "Invalid input syntax".to_string(),
            _ => self.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            match &self {
                AppError::DbError(err) => tracing::error!(error = %err, "database error"),
                AppError::OrmError(err) => tracing::error!(error = %err, "orm error"),
                AppError::Internal(err) => tracing::error!(error = %err, "internal error"),
                _ => {}
            }
        }

        let message = self.public_message();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

// Extractor rejections carry a client-facing explanation in `body_text`.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_codes_are_classified() {
        assert_eq!(DbErrorKind::from_code("23505"), DbErrorKind::UniqueViolation);
        assert_eq!(DbErrorKind::from_code("23503"), DbErrorKind::ForeignKeyViolation);
        assert_eq!(DbErrorKind::from_code("22P02"), DbErrorKind::InvalidInput);
        assert_eq!(DbErrorKind::from_code("40001"), DbErrorKind::Other);
    }

    #[test]
    fn client_errors_map_to_their_status() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("Token expired".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::Conflict("slot".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn errors_without_a_pg_code_are_server_errors() {
        let err = AppError::OrmError(DbErr::Custom("boom".into()));
        assert_eq!(err.db_error_kind(), None);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = AppError::DbError(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_slot_violation());
    }

    #[test]
    fn extractor_rejections_become_bad_requests() {
        let uri: axum::http::Uri = "/?page=two".parse().unwrap();
        let rejection = axum::extract::Query::<std::collections::HashMap<String, i64>>::try_from_uri(&uri)
            .unwrap_err();
        let err = AppError::from(rejection);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.public_message().starts_with("Bad Request: "));
    }

    #[test]
    fn server_errors_do_not_leak_details() {
        let err = AppError::Internal(anyhow::anyhow!("secret connection string"));
        assert_eq!(err.public_message(), "Internal Server Error");
    }
}
