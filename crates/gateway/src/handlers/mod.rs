//! API handlers module

pub mod auth;
pub mod chat;
pub mod health;
pub mod kb;
pub mod plan;
pub mod profile;
pub mod programs;
pub mod settings;

use crate::AppState;
use fitcore_common::{
    db::models::User,
    errors::{AppError, Result},
};
use uuid::Uuid;

/// Resolve an authenticated caller to its user record.
///
/// A valid token whose subject no longer exists is a 404, distinct from
/// the 401 the extractor produces for bad tokens.
pub(crate) async fn require_user(state: &AppState, user_id: Uuid) -> Result<User> {
    state
        .repo()
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound {
            id: user_id.to_string(),
        })
}
