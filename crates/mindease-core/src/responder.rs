//! Response Generator: empathetic free-text reply with a truncation guard and apology fallback.

use crate::error::PipelineError;
use crate::genai::{GenerationRequest, GenerativeModel};
use crate::prompts::{support_user_prompt, ENGLISH_PERSONA, HINGLISH_PERSONA};
use crate::retry::{Pause, RetryPolicy, TokioPause};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Only the most recent turns are sent upstream.
pub const CONTEXT_WINDOW: usize = 4;
pub const REPLY_TEMPERATURE: f32 = 0.8;
pub const REPLY_MAX_OUTPUT_TOKENS: u32 = 512;

pub const FALLBACK_REPLY: &str = "I'm having a little trouble replying right now, \
    but I'm here for you 💙 Please try again shortly.";

/// Endings accepted as a finished reply.
const TERMINAL_MARKERS: [&str; 6] = [".", "?", "!", "💙", "🤗", "🌟"];

/// Persona selector. Unknown tags (including `auto`) mean English.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Hinglish,
}

impl Language {
    pub fn parse(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("hinglish") {
            Language::Hinglish
        } else {
            Language::English
        }
    }

    pub fn persona(self) -> &'static str {
        match self {
            Language::English => ENGLISH_PERSONA,
            Language::Hinglish => HINGLISH_PERSONA,
        }
    }
}

fn default_role() -> String {
    "user".to_string()
}

/// One prior turn as sent by the chat UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTurn {
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReply {
    pub response: String,
    /// The language tag the caller asked for, echoed back unchanged.
    pub detected_language: String,
}

/// Flatten the last [`CONTEXT_WINDOW`] turns into `role: content` lines.
pub fn build_transcript(context: &[ContextTurn]) -> String {
    let start = context.len().saturating_sub(CONTEXT_WINDOW);
    context[start..]
        .iter()
        .map(|turn| format!("{}: {}\n", turn.role, turn.content))
        .collect()
}

/// Heuristic truncation check: the reply must end in punctuation or one of the persona emojis.
/// A reply ending in a closing quote or bracket is treated as incomplete.
pub fn is_complete_reply(reply: &str) -> bool {
    let reply = reply.trim_end();
    TERMINAL_MARKERS.iter().any(|marker| reply.ends_with(marker))
}

pub struct ResponseGenerator {
    model: Arc<dyn GenerativeModel>,
    model_name: String,
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
}

impl ResponseGenerator {
    pub fn new(model: Arc<dyn GenerativeModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            policy: RetryPolicy::default(),
            pause: Arc::new(TokioPause),
        }
    }

    pub fn with_retry(mut self, policy: RetryPolicy, pause: Arc<dyn Pause>) -> Self {
        self.policy = policy;
        self.pause = pause;
        self
    }

    fn request_for(
        &self,
        message: &str,
        context: &[ContextTurn],
        language: Language,
    ) -> GenerationRequest {
        GenerationRequest {
            model: self.model_name.clone(),
            system_instruction: language.persona().to_string(),
            parts: vec![support_user_prompt(&build_transcript(context), message)],
            response_schema: None,
            temperature: Some(REPLY_TEMPERATURE),
            max_output_tokens: Some(REPLY_MAX_OUTPUT_TOKENS),
        }
    }

    /// Generate a reply. Never fails: after the last failed attempt [`FALLBACK_REPLY`] is returned.
    pub async fn generate_response(
        &self,
        message: &str,
        context: &[ContextTurn],
        language: &str,
    ) -> GeneratedReply {
        let request = self.request_for(message, context, Language::parse(language));
        let request = &request;

        let response = match self
            .policy
            .run(self.pause.as_ref(), "Response generation", move |_attempt| {
                self.attempt(request)
            })
            .await
        {
            Ok(text) => text,
            Err(exhausted) => {
                tracing::error!(
                    target: "mindease::responder",
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Failed to generate response after retries; serving fallback"
                );
                FALLBACK_REPLY.to_string()
            }
        };

        GeneratedReply {
            response,
            detected_language: language.to_string(),
        }
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<String, PipelineError> {
        let raw = self.model.generate(request).await?;
        let reply = raw.trim();
        if reply.is_empty() {
            return Err(PipelineError::EmptyReply);
        }
        if !is_complete_reply(reply) {
            let start = reply.char_indices().rev().nth(15).map_or(0, |(i, _)| i);
            return Err(PipelineError::IncompleteReply {
                tail: reply[start..].to_string(),
            });
        }
        Ok(reply.to_string())
    }
}
