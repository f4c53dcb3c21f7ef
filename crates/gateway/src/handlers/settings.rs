//! Site settings handlers

use super::require_user;
use crate::extract::{AppJson, AuthUser};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use fitcore_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PutSettingRequest {
    pub value: serde_json::Value,
}

#[derive(Serialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: String,
}

/// Get a site setting by key
pub async fn get_setting(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
) -> Result<Json<SettingResponse>> {
    require_user(&state, auth.user_id).await?;

    let setting = state
        .repo()
        .get_setting(&key)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource_type: "setting".to_string(),
            id: key.clone(),
        })?;

    Ok(Json(SettingResponse {
        key: setting.key,
        value: setting.value,
        updated_at: setting.updated_at.to_rfc3339(),
    }))
}

/// Create or update a site setting (admin only)
pub async fn put_setting(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(key): Path<String>,
    AppJson(request): AppJson<PutSettingRequest>,
) -> Result<Json<SettingResponse>> {
    let user = require_user(&state, auth.user_id).await?;
    if !user.is_admin() {
        return Err(AppError::Forbidden {
            message: "Updating settings requires the admin role".to_string(),
        });
    }

    if key.trim().is_empty() {
        return Err(AppError::Validation {
            message: "setting key must not be empty".to_string(),
            field: Some("key".into()),
        });
    }

    state.repo().upsert_setting(&key, request.value.clone()).await?;

    tracing::info!(key = %key, user_id = %user.id, "Setting updated");

    Ok(Json(SettingResponse {
        key,
        value: request.value,
        updated_at: chrono::Utc::now().to_rfc3339(),
    }))
}
