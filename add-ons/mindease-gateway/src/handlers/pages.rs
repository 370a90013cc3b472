//! Landing page, chat page, health and session probe.

use crate::session::Session;
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, Response};
use axum::Json;
use serde_json::json;
use std::path::Path;

const PLACEHOLDER_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<h1>{title}</h1>
<p>{body}</p>
</body>
</html>
"#;

fn placeholder(title: &str, body: &str) -> String {
    PLACEHOLDER_PAGE
        .replace("{title}", title)
        .replace("{body}", body)
}

/// `file` under the static directory, or a placeholder when it is missing.
async fn page(static_dir: &str, file: &str, title: &str, body: &str) -> Html<String> {
    let path = Path::new(static_dir).join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html),
        Err(e) => {
            tracing::debug!(
                target: "mindease::http",
                path = %path.display(),
                error = %e,
                "page not found; serving placeholder"
            );
            Html(placeholder(title, body))
        }
    }
}

pub async fn health() -> &'static str {
    "OK"
}

/// GET /
pub async fn landing(State(state): State<AppState>) -> Html<String> {
    page(
        &state.config.static_dir,
        "index.html",
        &state.config.app_name,
        "A safe space to talk about how you feel. Open /chat to begin.",
    )
    .await
}

/// GET /chat: issues the session cookie on first visit.
pub async fn chat_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = Session::ensure(&headers);
    let html = page(
        &state.config.static_dir,
        "chat.html",
        &state.config.app_name,
        "The chat interface is not installed. POST to /api/chat to talk.",
    )
    .await;
    session.attach(html)
}

/// GET /api/session
pub async fn session_info(headers: HeaderMap) -> Response {
    let session = Session::ensure(&headers);
    let body = Json(json!({ "session_id": session.id }));
    session.attach(body)
}
