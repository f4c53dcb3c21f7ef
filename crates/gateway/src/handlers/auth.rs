//! Registration and login handlers

use crate::extract::AppJson;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use fitcore_common::{
    auth::{hash_password, verify_password},
    db::models::{User, UserRole},
    errors::{AppError, Result},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 64))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[serde(default = "default_language")]
    pub preferred_language: String,

    /// "member" (default) or "trainer"; admins are provisioned out of band
    #[serde(default)]
    pub role: Option<String>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user record
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub preferred_language: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            preferred_language: user.preferred_language,
            role: user.role,
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Parse the requested role; admin self-registration is rejected
fn requested_role(role: &Option<String>) -> Result<UserRole> {
    match role.as_deref() {
        None | Some("member") => Ok(UserRole::Member),
        Some("trainer") => Ok(UserRole::Trainer),
        Some(other) => Err(AppError::Validation {
            message: format!("Invalid role: {}", other),
            field: Some("role".into()),
        }),
    }
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let role = requested_role(&request.role)?;
    let password_hash = hash_password(&request.password)?;

    let user = state
        .repo()
        .create_user(
            request.username,
            request.email,
            password_hash,
            request.preferred_language,
            role,
        )
        .await?;

    let token = state.jwt.generate_token(user.id, &user.role)?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// Log in with username and password
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = state
        .repo()
        .find_user_by_username(&request.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.jwt.generate_token(user.id, &user.role)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_role() {
        assert_eq!(requested_role(&None).unwrap(), UserRole::Member);
        assert_eq!(
            requested_role(&Some("member".into())).unwrap(),
            UserRole::Member
        );
        assert_eq!(
            requested_role(&Some("trainer".into())).unwrap(),
            UserRole::Trainer
        );
        assert!(requested_role(&Some("admin".into())).is_err());
        assert!(requested_role(&Some("owner".into())).is_err());
    }

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            username: "ab".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            preferred_language: "en".into(),
            role: None,
        };
        assert!(request.validate().is_err());

        let request = RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "a-long-enough-password".into(),
            preferred_language: "pt".into(),
            role: None,
        };
        assert!(request.validate().is_ok());
    }
}
