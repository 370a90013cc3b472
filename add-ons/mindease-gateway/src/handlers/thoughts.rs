//! Journal: `/api/save-thought` and `/api/thoughts`.

use super::ApiError;
use crate::session::Session;
use crate::store::{NewThought, ThoughtRow};
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use mindease_core::Emotion;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const EMPTY_THOUGHT: &str = "Thought content cannot be empty";
pub const SAVE_FAILED: &str = "Failed to save thought";

#[derive(Debug, Default, Deserialize)]
pub struct SaveThoughtRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SaveThoughtResponse {
    pub status: &'static str,
    pub thought_id: i64,
    pub emotions: Vec<Emotion>,
}

#[derive(Debug, Serialize)]
pub struct ThoughtView {
    pub id: i64,
    pub content: String,
    pub emotions: Vec<String>,
    pub timestamp: String,
    pub date: String,
    pub time: String,
}

impl From<ThoughtRow> for ThoughtView {
    fn from(row: ThoughtRow) -> Self {
        Self {
            id: row.id,
            timestamp: row.timestamp.to_rfc3339(),
            date: row.timestamp.format("%Y-%m-%d").to_string(),
            time: row.timestamp.format("%H:%M").to_string(),
            content: row.content,
            emotions: row.emotions,
        }
    }
}

/// POST /api/save-thought: classify and store a journal entry.
pub async fn save_thought(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<SaveThoughtRequest>>,
) -> Response {
    let session = Session::ensure(&headers);
    let content = body
        .map(|Json(r)| r.content.trim().to_string())
        .unwrap_or_default();
    if content.is_empty() {
        return session.attach(ApiError::Validation(EMPTY_THOUGHT));
    }

    let emotions = state.pipeline.classifier.detect_emotions(&content).await;
    let labels = emotions.emotions.clone();
    let new = NewThought {
        session_id: session.id.clone(),
        content,
        emotions,
        timestamp: Utc::now(),
    };

    match state.store.blocking(move |s| s.insert_thought(&new)).await {
        Ok(row) => {
            tracing::info!(target: "mindease::http", thought_id = row.id, "thought saved");
            session.attach(Json(SaveThoughtResponse {
                status: "success",
                thought_id: row.id,
                emotions: labels,
            }))
        }
        Err(e) => {
            tracing::error!(target: "mindease::http", error = %e, "Error saving thought");
            session.attach(ApiError::Internal(SAVE_FAILED))
        }
    }
}

/// GET /api/thoughts: the session's journal, newest first.
pub async fn list_thoughts(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(session) = Session::existing(&headers) else {
        return Json(json!({ "thoughts": [] })).into_response();
    };

    match state
        .store
        .blocking(move |s| s.thoughts_for_session(&session.id))
        .await
    {
        Ok(rows) => {
            let thoughts: Vec<ThoughtView> = rows.into_iter().map(ThoughtView::from).collect();
            Json(json!({ "thoughts": thoughts })).into_response()
        }
        Err(e) => {
            tracing::error!(target: "mindease::http", error = %e, "Error getting thoughts");
            Json(json!({ "thoughts": [] })).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    #[test]
    fn thought_view_formats_date_and_time() {
        let view = ThoughtView::from(ThoughtRow {
            id: 7,
            session_id: "s".to_string(),
            content: "walked by the sea".to_string(),
            emotions: vec!["calm".to_string()],
            emotion_scores: BTreeMap::new(),
            timestamp: Utc.with_ymd_and_hms(2026, 5, 2, 18, 4, 9).unwrap(),
        });
        assert_eq!(view.date, "2026-05-02");
        assert_eq!(view.time, "18:04");
        assert_eq!(view.timestamp, "2026-05-02T18:04:09+00:00");
    }
}
