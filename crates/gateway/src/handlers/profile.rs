//! Member and trainer profile handlers

use super::require_user;
use crate::extract::{AppJson, AuthUser};
use crate::handlers::auth::UserResponse;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use fitcore_common::{
    auth::{hash_password, verify_password},
    errors::{AppError, Result},
};
use serde::Deserialize;
use validator::Validate;

/// Profile update request; omitted fields are left unchanged
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 2, max = 16))]
    pub preferred_language: Option<String>,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Get the caller's profile
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>> {
    let user = require_user(&state, auth.user_id).await?;
    Ok(Json(user.into()))
}

/// Update the caller's profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    // Resolve first so a stale token surfaces as 404, not a write error
    require_user(&state, auth.user_id).await?;

    let user = state
        .repo()
        .update_profile(auth.user_id, request.email, request.preferred_language)
        .await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(user.into()))
}

/// Change the caller's password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let user = require_user(&state, auth.user_id).await?;

    if !verify_password(&request.current_password, &user.password_hash)? {
        return Err(AppError::Validation {
            message: "Current password is incorrect".to_string(),
            field: Some("current_password".into()),
        });
    }

    let new_hash = hash_password(&request.new_password)?;
    state.repo().update_password(user.id, new_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}
