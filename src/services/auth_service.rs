use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use password_hash::rand_core::OsRng;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    config::AuthSettings,
    db::DbPool,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    error::{AppError, AppResult},
    models::{Role, User},
    response::{ApiResponse, Meta},
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AppResult<User> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        Ok(User {
            id: self.id,
            email: self.email,
            role,
            created_at: self.created_at,
        })
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(settings: &AuthSettings, user_id: Uuid, role: Role) -> AppResult<String> {
    issue_token_with_expiry(settings, user_id, role).map(|(token, _)| token)
}

/// Signs `{sub, role, exp}` and returns the token with its expiry instant.
pub fn issue_token_with_expiry(
    settings: &AuthSettings,
    user_id: Uuid,
    role: Role,
) -> AppResult<(String, DateTime<Utc>)> {
    let expires_at = Utc::now()
        .checked_add_signed(Duration::hours(settings.jwt_expiry_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expires_at.timestamp().max(0) as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    Ok((token, expires_at))
}

pub fn decode_token(settings: &AuthSettings, token: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::Unauthorized("Token expired".into()),
        _ => AppError::Unauthorized("Invalid token".into()),
    })
}

pub async fn register_user(
    pool: &DbPool,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest { email, password } = payload;
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(email.as_str())
        .fetch_optional(pool)
        .await?;

    if exist.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;

    let row: UserRow = sqlx::query_as(
        "INSERT INTO users (id, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(email.as_str())
    .bind(password_hash)
    .bind(Role::Patient.as_str())
    .fetch_one(pool)
    .await?;
    let user = row.into_user()?;

    audit::record(
        pool,
        Some(user.id),
        AuditAction::UserRegister,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(ApiResponse::success("User created", user, None))
}

pub async fn login_user(
    pool: &DbPool,
    settings: &AuthSettings,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user: Option<UserRow> = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let user = user.into_user()?;
    let (token, expires_at) = issue_token_with_expiry(settings, user.id, user.role)?;

    audit::record(
        pool,
        Some(user.id),
        AuditAction::UserLogin,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            user_id: user.id,
            role: user.role,
            expires_at,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret".into(),
            jwt_expiry_hours: 24,
        }
    }

    #[test]
    fn issued_tokens_decode_with_the_same_secret() {
        let user_id = Uuid::new_v4();
        let token = issue_token(&settings(), user_id, Role::Receptionist).unwrap();
        let claims = decode_token(&settings(), &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "receptionist");
    }

    #[test]
    fn tokens_signed_elsewhere_are_unauthorized() {
        let token = issue_token(&settings(), Uuid::new_v4(), Role::Admin).unwrap();
        let other = AuthSettings {
            jwt_secret: "another-secret".into(),
            jwt_expiry_hours: 24,
        };
        assert!(matches!(
            decode_token(&other, &token),
            Err(AppError::Unauthorized(msg)) if msg == "Invalid token"
        ));
    }

    #[test]
    fn expired_tokens_report_expiry() {
        let expired = AuthSettings {
            jwt_secret: "test-secret".into(),
            jwt_expiry_hours: -2,
        };
        let token = issue_token(&expired, Uuid::new_v4(), Role::Doctor).unwrap();
        assert!(matches!(
            decode_token(&settings(), &token),
            Err(AppError::Unauthorized(msg)) if msg == "Token expired"
        ));
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }
}
