//! `/api/chat` and `/api/emotions/history`.

use super::ApiError;
use crate::session::Session;
use crate::store::NewConversation;
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use mindease_core::{ContextTurn, Emotion, EmotionScores};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub const EMPTY_MESSAGE: &str = "Message cannot be empty";
pub const CHAT_FAILED: &str =
    "I apologize, but I'm having trouble processing your message right now. Please try again.";

/// Conversations replayed by the history endpoint.
pub const HISTORY_LIMIT: usize = 50;

fn default_language() -> String {
    "auto".to_string()
}

/// Body of `POST /api/chat`. Fields that are missing or of the wrong type take their defaults,
/// so only an empty `message` is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub language: String,
    pub context: Vec<ContextTurn>,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            message: String::new(),
            language: default_language(),
            context: Vec::new(),
        }
    }
}

impl ChatRequest {
    pub fn from_json(body: &Value) -> Self {
        let message = body.get("message").and_then(Value::as_str).unwrap_or_default();
        let language = body.get("language").and_then(Value::as_str);
        let context = body
            .get("context")
            .and_then(Value::as_array)
            .map(|turns| turns.iter().filter_map(context_turn).collect())
            .unwrap_or_default();
        Self {
            message: message.to_string(),
            language: language.map_or_else(default_language, str::to_string),
            context,
        }
    }
}

/// Non-object turns are skipped; non-string content is kept in its JSON text form.
fn context_turn(value: &Value) -> Option<ContextTurn> {
    let turn = value.as_object()?;
    let role = turn.get("role").and_then(Value::as_str).unwrap_or("user");
    let content = match turn.get("content") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };
    Some(ContextTurn {
        role: role.to_string(),
        content,
    })
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub response: String,
    pub emotions: Vec<Emotion>,
    pub emotion_scores: EmotionScores,
    pub detected_language: String,
}

/// POST /api/chat: classify, reply, persist.
pub async fn api_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Response {
    let session = Session::ensure(&headers);
    let request = body
        .map(|Json(value)| ChatRequest::from_json(&value))
        .unwrap_or_default();
    let message = request.message.trim().to_string();
    if message.is_empty() {
        return session.attach(ApiError::Validation(EMPTY_MESSAGE));
    }

    tracing::info!(
        target: "mindease::http",
        chars = message.chars().count(),
        context_turns = request.context.len(),
        language = %request.language,
        "chat message received"
    );

    let emotions = state.pipeline.classifier.detect_emotions(&message).await;
    let reply = state
        .pipeline
        .responder
        .generate_response(&message, &request.context, &request.language)
        .await;

    let new = NewConversation {
        session_id: session.id.clone(),
        user_message: message,
        bot_response: reply.response.clone(),
        emotions: emotions.clone(),
        timestamp: Utc::now(),
    };
    if let Err(e) = state.store.blocking(move |s| s.insert_conversation(&new)).await {
        tracing::error!(target: "mindease::http", error = %e, "Error in chat API");
        return session.attach(ApiError::Internal(CHAT_FAILED));
    }

    session.attach(Json(ChatResponse {
        status: "success",
        response: reply.response,
        emotions: emotions.emotions,
        emotion_scores: emotions.scores,
        detected_language: reply.detected_language,
    }))
}

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub timestamp: String,
    pub emotions: Vec<String>,
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub emotions: Vec<HistoryEntry>,
    pub trends: BTreeMap<String, usize>,
    pub total_messages: usize,
}

fn empty_history() -> Json<serde_json::Value> {
    Json(json!({ "emotions": [], "trends": {} }))
}

/// GET /api/emotions/history: the session's last conversations, oldest first, with label counts.
pub async fn emotion_history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session) = Session::existing(&headers) else {
        return empty_history().into_response();
    };

    let rows = match state
        .store
        .blocking(move |s| s.recent_conversations(&session.id, HISTORY_LIMIT))
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(target: "mindease::http", error = %e, "Error getting emotion history");
            return empty_history().into_response();
        }
    };

    let total_messages = rows.len();
    let mut emotions = Vec::new();
    let mut trends: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows.into_iter().rev() {
        if row.emotions.is_empty() {
            continue;
        }
        for label in &row.emotions {
            *trends.entry(label.clone()).or_default() += 1;
        }
        emotions.push(HistoryEntry {
            timestamp: row.timestamp.to_rfc3339(),
            emotions: row.emotions,
            scores: row.emotion_scores,
        });
    }

    Json(HistoryResponse {
        emotions,
        trends,
        total_messages,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: &str, content: &str) -> ContextTurn {
        ContextTurn {
            role: role.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn wrongly_typed_optional_fields_fall_back() {
        let request = ChatRequest::from_json(&json!({
            "message": "I feel sad",
            "language": null,
            "context": [
                { "role": "user", "content": 5 },
                "not a turn",
                { "content": "no role" },
                { "role": "bot" }
            ]
        }));
        assert_eq!(request.message, "I feel sad");
        assert_eq!(request.language, "auto");
        assert_eq!(
            request.context,
            vec![turn("user", "5"), turn("user", "no role"), turn("bot", "")]
        );
    }

    #[test]
    fn non_string_message_reads_as_empty() {
        let request = ChatRequest::from_json(&json!({ "message": 42, "context": "x" }));
        assert_eq!(request.message, "");
        assert!(request.context.is_empty());
        assert_eq!(ChatRequest::from_json(&json!([1, 2])), ChatRequest::default());
    }
}
