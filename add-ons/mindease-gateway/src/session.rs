//! Browser session identity carried in a cookie.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};

pub const SESSION_COOKIE: &str = "mindease_session";

/// Stored session ids are capped at this length.
const MAX_SESSION_ID_LEN: usize = 100;

/// Value of `name` from any `Cookie` header, if present.
fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    for value in headers.get_all(COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for cookie in value.split(';') {
            let cookie = cookie.trim();
            if let Some(rest) = cookie.strip_prefix(name) {
                if let Some(val) = rest.strip_prefix('=') {
                    return Some(val.trim());
                }
            }
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Minted on this request; the response must carry `Set-Cookie`.
    pub is_new: bool,
}

impl Session {
    /// The session named by the request cookie, if it holds a usable id.
    pub fn existing(headers: &HeaderMap) -> Option<Self> {
        extract_cookie(headers, SESSION_COOKIE)
            .filter(|id| (1..=MAX_SESSION_ID_LEN).contains(&id.len()))
            .map(|id| Self {
                id: id.to_string(),
                is_new: false,
            })
    }

    /// The request's session, or a fresh random one.
    pub fn ensure(headers: &HeaderMap) -> Self {
        Self::existing(headers).unwrap_or_else(|| {
            let session = Self {
                id: uuid::Uuid::new_v4().to_string(),
                is_new: true,
            };
            tracing::debug!(target: "mindease::http", "new session issued");
            session
        })
    }

    pub fn cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", self.id)
    }

    /// Turn `response` into a [`Response`], adding `Set-Cookie` when the session is new.
    pub fn attach(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.is_new {
            match HeaderValue::from_str(&self.cookie()) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(target: "mindease::http", error = %e, "session cookie not set");
                }
            }
        }
        response
    }
}
