//! Request extractors
//!
//! `AuthUser` resolves the bearer token to an authenticated identity;
//! `AppJson` is a Json wrapper whose rejection maps into the application
//! error taxonomy, so malformed bodies produce a 400 validation error
//! with the standard error envelope.

use crate::AppState;
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use fitcore_common::{
    auth::extract_bearer_token,
    db::models::UserRole,
    errors::AppError,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

/// Authenticated caller identity, extracted from the bearer token.
///
/// Token validation failures are 401; whether the subject still resolves
/// to a user row is checked by handlers that need the full record.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer_token(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header is not a bearer token".to_string(),
        })?;

        let claims = state.jwt.validate_token(token)?;

        Ok(AuthUser {
            user_id: claims.user_id()?,
            role: UserRole::from(claims.role),
        })
    }
}

/// Json extractor that rejects with the application error envelope
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::Validation {
                message: rejection.body_text(),
                field: None,
            }),
        }
    }
}
