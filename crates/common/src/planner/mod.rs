//! Planner/executor collaborator abstraction
//!
//! The AI assistant interprets a member's message, may execute actions
//! (book a class, adjust a program, answer a question), and returns a
//! structured outcome. The planning algorithm itself is an opaque external
//! service; only the wire contract lives here.

use crate::config::PlannerConfig;
use crate::db::models::User;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Structured outcome of one planning/execution round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// Natural-language reply shown to the member
    pub assistant_response: String,

    /// Actions the planner executed, in order
    #[serde(default)]
    pub actions: Vec<serde_json::Value>,

    /// Per-action results, aligned with `actions`
    #[serde(default)]
    pub results: Vec<serde_json::Value>,

    /// Errors encountered while executing actions
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Trait for the planning/execution collaborator
#[async_trait]
pub trait Planner: Send + Sync {
    /// Plan and execute for one user message
    async fn plan(&self, message: &str, user: &User, language: &str) -> Result<PlanOutcome>;
}

/// HTTP client for the planner service
pub struct HttpPlanner {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct PlanRequest<'a> {
    message: &'a str,
    user_id: String,
    username: &'a str,
    language: &'a str,
}

impl HttpPlanner {
    /// Create a new planner client from configuration
    pub fn new(config: &PlannerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Planner for HttpPlanner {
    async fn plan(&self, message: &str, user: &User, language: &str) -> Result<PlanOutcome> {
        let url = format!("{}/plan", self.base_url);

        let request = PlanRequest {
            message,
            user_id: user.id.to_string(),
            username: &user.username,
            language,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Planner {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Planner {
                message: format!("Planner error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::Planner {
            message: format!("Failed to parse planner response: {}", e),
        })
    }
}

/// Scripted planner for tests and offline development: echoes the message
/// back without executing any actions
pub struct EchoPlanner;

#[async_trait]
impl Planner for EchoPlanner {
    async fn plan(&self, message: &str, user: &User, language: &str) -> Result<PlanOutcome> {
        Ok(PlanOutcome {
            assistant_response: format!(
                "[{}] {}: I heard you say \"{}\"",
                language, user.username, message
            ),
            actions: vec![],
            results: vec![],
            errors: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            preferred_language: "en".into(),
            role: "member".into(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_outcome_deserialization_defaults() {
        // Missing action/result/error lists deserialize as empty
        let outcome: PlanOutcome =
            serde_json::from_str(r#"{"assistant_response": "hi"}"#).unwrap();
        assert_eq!(outcome.assistant_response, "hi");
        assert!(outcome.actions.is_empty());
        assert!(outcome.results.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_outcome_full_deserialization() {
        let outcome: PlanOutcome = serde_json::from_str(
            r#"{
                "assistant_response": "Booked.",
                "actions": [{"name": "book_class", "class": "yoga"}],
                "results": [{"status": "ok"}],
                "errors": ["capacity warning"]
            }"#,
        )
        .unwrap();
        assert_eq!(outcome.actions.len(), 1);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.errors, vec!["capacity warning".to_string()]);
    }

    #[tokio::test]
    async fn test_echo_planner() {
        let planner = EchoPlanner;
        let user = test_user();
        let outcome = planner.plan("hello", &user, "en").await.unwrap();
        assert!(outcome.assistant_response.contains("hello"));
        assert!(outcome.actions.is_empty());
    }
}
