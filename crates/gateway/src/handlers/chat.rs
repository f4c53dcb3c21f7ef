//! Chat session and history handlers

use crate::extract::{AppJson, AuthUser};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use fitcore_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};

/// A chat session as returned to the client
#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub title: Option<String>,
    pub created_at: String,
}

/// A chat turn as returned to the client
#[derive(Serialize)]
pub struct TurnResponse {
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub session_id: Option<String>,

    #[serde(default = "default_history_limit")]
    pub limit: u64,
}

fn default_history_limit() -> u64 {
    200
}

#[derive(Debug, Deserialize)]
pub struct SetTitleRequest {
    pub title: String,
}

/// List the caller's chat sessions, newest first
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<SessionResponse>>> {
    let sessions = state.repo().list_chat_sessions(auth.user_id).await?;

    Ok(Json(
        sessions
            .into_iter()
            .map(|s| SessionResponse {
                session_id: s.session_id,
                title: s.title,
                created_at: s.created_at.to_rfc3339(),
            })
            .collect(),
    ))
}

/// Set the title of one of the caller's sessions
pub async fn set_session_title(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
    AppJson(request): AppJson<SetTitleRequest>,
) -> Result<Json<SessionResponse>> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation {
            message: "title must not be empty".to_string(),
            field: Some("title".into()),
        });
    }

    let session = state
        .repo()
        .set_session_title(auth.user_id, &session_id, title.to_string())
        .await?;

    Ok(Json(SessionResponse {
        session_id: session.session_id,
        title: session.title,
        created_at: session.created_at.to_rfc3339(),
    }))
}

/// List the caller's chat history, oldest first
pub async fn list_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<TurnResponse>>> {
    let turns = state
        .repo()
        .list_chat_history(auth.user_id, params.session_id.as_deref(), params.limit)
        .await?;

    Ok(Json(
        turns
            .into_iter()
            .map(|t| TurnResponse {
                session_id: t.session_id,
                message: t.message,
                response: t.response,
                created_at: t.created_at.to_rfc3339(),
            })
            .collect(),
    ))
}
