//! Website knowledge-base handlers
//!
//! Querying is a pure read: embed the query, rank stored chunks by cosine
//! similarity, return the top-K. Re-indexing replaces the source and all
//! chunks wholesale and is restricted to admins.

use super::require_user;
use crate::extract::{AppJson, AuthUser};
use crate::AppState;
use axum::{extract::State, Json};
use fitcore_common::{
    chunker,
    db::KbSearchResult,
    errors::{AppError, Result},
    metrics as app_metrics,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Instant;

const DEFAULT_TOP_K: usize = 3;

/// KB query request
#[derive(Debug, Deserialize)]
pub struct KbQueryRequest {
    pub query: String,

    /// Number of results; any shape that does not coerce to a
    /// non-negative integer silently falls back to the default
    #[serde(default = "default_top_k", deserialize_with = "lenient_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Coerce `top_k` leniently: integers pass through, numeric strings are
/// parsed, everything else becomes the default. Never errors.
fn lenient_top_k<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_top_k(&value))
}

fn coerce_top_k(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_TOP_K),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(DEFAULT_TOP_K),
        _ => DEFAULT_TOP_K,
    }
}

/// Validate the query: blank after trimming is a 400 before any
/// collaborator call
fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation {
            message: "query must not be empty".to_string(),
            field: Some("query".into()),
        });
    }
    Ok(trimmed)
}

/// KB query response
#[derive(Serialize)]
pub struct KbQueryResponse {
    pub query: String,
    pub results: Vec<KbSearchResult>,
}

/// Re-index request
#[derive(Debug, Deserialize)]
pub struct ReindexRequest {
    /// Full website content to chunk, embed, and index
    pub content: String,
}

#[derive(Serialize)]
pub struct ReindexResponse {
    pub chunks_indexed: usize,
}

/// Query the website knowledge base
pub async fn query(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<KbQueryRequest>,
) -> Result<Json<KbQueryResponse>> {
    let start = Instant::now();

    require_user(&state, auth.user_id).await?;

    let query_text = validate_query(&request.query)?;

    let embedding = state.embedder.embed(query_text).await?;
    let results = state.repo().kb_search(&embedding, request.top_k).await?;

    let duration = start.elapsed().as_secs_f64();
    app_metrics::record_kb_query(duration, results.len());

    tracing::info!(
        user_id = %auth.user_id,
        top_k = request.top_k,
        results = results.len(),
        latency_ms = (duration * 1000.0) as u64,
        "KB query completed"
    );

    Ok(Json(KbQueryResponse {
        query: request.query,
        results,
    }))
}

/// Rebuild the knowledge base from new website content (admin only)
pub async fn reindex(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(request): AppJson<ReindexRequest>,
) -> Result<Json<ReindexResponse>> {
    let user = require_user(&state, auth.user_id).await?;
    if !user.is_admin() {
        return Err(AppError::Forbidden {
            message: "Re-indexing requires the admin role".to_string(),
        });
    }

    if request.content.trim().is_empty() {
        return Err(AppError::Validation {
            message: "content must not be empty".to_string(),
            field: Some("content".into()),
        });
    }

    let chunks = chunker::chunk_text(&request.content, &state.config.kb);
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = state.embedder.embed_batch(&texts).await?;

    let rows = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| (chunk.index, chunk.content, embedding))
        .collect();

    let chunks_indexed = state
        .repo()
        .replace_kb_index(&request.content, rows)
        .await?;

    app_metrics::record_kb_reindex(chunks_indexed);

    tracing::info!(
        user_id = %user.id,
        chunks_indexed,
        "Knowledge base re-indexed"
    );

    Ok(Json(ReindexResponse { chunks_indexed }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> KbQueryRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_top_k_defaults_when_absent() {
        let request = parse(json!({"query": "opening hours"}));
        assert_eq!(request.top_k, 3);
    }

    #[test]
    fn test_top_k_integer_passes_through() {
        let request = parse(json!({"query": "opening hours", "top_k": 2}));
        assert_eq!(request.top_k, 2);
    }

    #[test]
    fn test_top_k_numeric_string_parses() {
        let request = parse(json!({"query": "opening hours", "top_k": "5"}));
        assert_eq!(request.top_k, 5);
    }

    #[test]
    fn test_top_k_garbage_falls_back_silently() {
        assert_eq!(parse(json!({"query": "q", "top_k": "lots"})).top_k, 3);
        assert_eq!(parse(json!({"query": "q", "top_k": -4})).top_k, 3);
        assert_eq!(parse(json!({"query": "q", "top_k": 2.7})).top_k, 3);
        assert_eq!(parse(json!({"query": "q", "top_k": {"n": 1}})).top_k, 3);
        assert_eq!(parse(json!({"query": "q", "top_k": null})).top_k, 3);
    }

    #[test]
    fn test_coerce_top_k_zero_is_allowed() {
        assert_eq!(coerce_top_k(&json!(0)), 0);
    }

    #[test]
    fn test_validate_query() {
        assert!(validate_query("").is_err());
        assert!(validate_query("   \n\t ").is_err());
        assert_eq!(validate_query("  opening hours  ").unwrap(), "opening hours");
    }
}
