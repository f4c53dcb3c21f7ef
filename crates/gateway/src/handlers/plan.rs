//! AI assistant plan endpoint
//!
//! One request is one chat turn: the member's message goes to the planner
//! collaborator, the resulting turn is persisted together with its session
//! row in a single transaction, and an audit entry is enqueued out of band.

use super::require_user;
use crate::extract::{AppJson, AuthUser};
use crate::AppState;
use axum::{extract::State, Json};
use fitcore_common::{
    audit::AuditEntry,
    errors::{AppError, Result},
    metrics as app_metrics,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

/// Plan request
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    /// The member's message; required and non-empty
    pub message: Option<String>,

    /// Opaque conversation token; blank or absent starts a new conversation
    pub session_id: Option<String>,
}

/// Plan response
#[derive(Serialize)]
pub struct PlanResponse {
    pub assistant_response: String,
    pub actions: Vec<serde_json::Value>,
    pub results: Vec<serde_json::Value>,
    pub errors: Vec<String>,
    pub session_id: String,
}

/// Validate the message field: absent or blank is a 400 before any side effect
fn validate_message(message: &Option<String>) -> Result<&str> {
    match message.as_deref() {
        Some(m) if !m.trim().is_empty() => Ok(m),
        _ => Err(AppError::Validation {
            message: "message must be a non-empty string".to_string(),
            field: Some("message".into()),
        }),
    }
}

/// Resolve the conversation token: echo the caller's id, or mint a fresh
/// one when absent or blank
fn resolve_session_id(session_id: &Option<String>) -> String {
    match session_id.as_deref() {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Handle one chat turn
pub async fn plan(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<PlanRequest>,
) -> Result<Json<PlanResponse>> {
    let start = Instant::now();

    let message = validate_message(&request.message)?.to_string();
    let user = require_user(&state, auth.user_id).await?;
    let session_id = resolve_session_id(&request.session_id);

    let outcome = state
        .planner
        .plan(&message, &user, &user.preferred_language)
        .await?;

    // One transaction: chat turn + idempotent session row
    state
        .repo()
        .record_chat_turn(user.id, &session_id, &message, &outcome.assistant_response)
        .await?;

    // Best effort; never fails the request
    state.audit.record(AuditEntry {
        user_id: user.id,
        message: message.clone(),
        response: outcome.assistant_response.clone(),
        actions: outcome.actions.clone(),
        results: outcome.results.clone(),
        errors: outcome.errors.clone(),
    });

    let duration = start.elapsed().as_secs_f64();
    app_metrics::record_plan(duration, outcome.actions.len(), outcome.errors.len());

    tracing::info!(
        user_id = %user.id,
        session_id = %session_id,
        actions = outcome.actions.len(),
        errors = outcome.errors.len(),
        latency_ms = (duration * 1000.0) as u64,
        "Plan request completed"
    );

    Ok(Json(PlanResponse {
        assistant_response: outcome.assistant_response,
        actions: outcome.actions,
        results: outcome.results,
        errors: outcome.errors,
        session_id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_message() {
        assert!(validate_message(&None).is_err());
        assert!(validate_message(&Some("".into())).is_err());
        assert!(validate_message(&Some("   ".into())).is_err());
        assert_eq!(validate_message(&Some("hello".into())).unwrap(), "hello");
    }

    #[test]
    fn test_resolve_session_id_echoes_caller_value() {
        let sid = resolve_session_id(&Some("session-abc".into()));
        assert_eq!(sid, "session-abc");
    }

    #[test]
    fn test_resolve_session_id_generates_when_absent() {
        let a = resolve_session_id(&None);
        let b = resolve_session_id(&None);
        assert!(!a.is_empty());
        // Fresh ids are distinct across calls
        assert_ne!(a, b);
        // And parse as UUIDs
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_resolve_session_id_generates_when_blank() {
        let sid = resolve_session_id(&Some("   ".into()));
        assert!(Uuid::parse_str(&sid).is_ok());
    }
}
