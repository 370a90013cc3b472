//! Per-attempt failures of the classifier and responder.
//!
//! None of these reach the HTTP surface: they are counted against the retry budget and then
//! replaced by a fallback result.

use crate::genai::GenAiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Upstream(#[from] GenAiError),

    #[error("Malformed emotion analysis: {0}")]
    MalformedAnalysis(#[from] serde_json::Error),

    #[error("Emotion analysis contained no known emotion labels")]
    NoKnownEmotions,

    #[error("Empty reply from model")]
    EmptyReply,

    #[error("Incomplete reply (no terminal marker): {tail:?}")]
    IncompleteReply { tail: String },
}
