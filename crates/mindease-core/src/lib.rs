//! mindease-core: the emotion-classification-and-response pipeline.
//!
//! Both components talk to a [`GenerativeModel`] injected at construction time, retry with a
//! bounded [`RetryPolicy`], and always produce a result: when the upstream service keeps failing
//! the classifier degrades to keyword matching and the responder to a fixed apology.

mod classifier;
mod config;
mod emotion;
mod error;
mod genai;
pub mod prompts;
mod responder;
mod retry;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

pub use classifier::EmotionClassifier;
pub use config::{MindEaseConfig, DEFAULT_CONFIG_PATH};
pub use emotion::{
    fallback_emotion_detection, Emotion, EmotionAnalysis, EmotionResult, EmotionScores,
    DEFAULT_EMOTION_SCORE, DOMINANT_EMOTION_SCORE, FALLBACK_INTENSITY, KEYWORD_SCORE,
    MAX_EMOTIONS, NO_MATCH_SCORE,
};
pub use error::PipelineError;
pub use genai::{
    GeminiClient, GenAiError, GenerationRequest, GenerativeModel, DEFAULT_GEMINI_BASE_URL,
};
pub use responder::{
    build_transcript, is_complete_reply, ContextTurn, GeneratedReply, Language,
    ResponseGenerator, CONTEXT_WINDOW, FALLBACK_REPLY,
};
pub use retry::{Pause, RetryExhausted, RetryPolicy, TokioPause};

/// Classifier and responder sharing one generative client.
#[derive(Clone)]
pub struct SupportPipeline {
    pub classifier: Arc<EmotionClassifier>,
    pub responder: Arc<ResponseGenerator>,
}

impl SupportPipeline {
    /// Build both components over an already constructed model client.
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        config: &MindEaseConfig,
        pause: Arc<dyn Pause>,
    ) -> Self {
        let policy = config.retry_policy();
        let classifier = EmotionClassifier::new(Arc::clone(&model), config.classifier_model.clone())
            .with_retry(policy, Arc::clone(&pause));
        let responder = ResponseGenerator::new(model, config.responder_model.clone())
            .with_retry(policy, pause);
        Self {
            classifier: Arc::new(classifier),
            responder: Arc::new(responder),
        }
    }

    /// Production wiring: Gemini over reqwest, tokio sleeps between attempts.
    pub fn from_config(config: &MindEaseConfig) -> Result<Self, GenAiError> {
        let client = GeminiClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config, Arc::new(TokioPause)))
    }
}
