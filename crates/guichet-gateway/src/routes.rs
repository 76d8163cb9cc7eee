//! API route handlers for the gateway.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use guichet_core::types::KnowledgeEntry;

use super::server::AppState;

/// Question length accepted over the wire, counted after trimming.
const MIN_QUESTION_CHARS: usize = 3;
const MAX_QUESTION_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question: String,
}

fn entry_json(entry: &KnowledgeEntry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "theme": entry.theme,
        "question": entry.question,
        "answer": entry.answer,
    })
}

/// Answer one question with the strategy bound at startup.
pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnswerRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    let question = req.question.trim();
    let chars = question.chars().count();
    if !(MIN_QUESTION_CHARS..=MAX_QUESTION_CHARS).contains(&chars) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": format!(
                    "la question doit faire entre {MIN_QUESTION_CHARS} et {MAX_QUESTION_CHARS} caractères"
                ),
            })),
        );
    }

    debug!(chars, strategy = %state.strategy.kind(), "answer request");
    match state.strategy.answer(question).await {
        Ok(result) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "answer": result.text,
                "confidence": result.confidence,
                "strategy": result.strategy,
                "sources": result.sources,
                "latency_ms": result.latency_ms,
            })),
        ),
        // only unusable input crosses answer() as Err
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        ),
    }
}

/// List the loaded FAQ entries.
pub async fn list_faq(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let entries: Vec<serde_json::Value> = state.index.entries().map(entry_json).collect();
    Json(serde_json::json!({
        "total": entries.len(),
        "entries": entries,
    }))
}

/// Fetch one FAQ entry by id.
pub async fn get_faq_entry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.index.get(&id) {
        Some(entry) => (StatusCode::OK, Json(entry_json(entry))),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("entrée FAQ '{id}' inconnue") })),
        ),
    }
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "faq_count": state.index.len(),
    }))
}
