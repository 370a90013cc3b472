//! Emotion Classifier: structured judgment from the generative service, keyword fallback after
//! the retry budget is spent.

use crate::emotion::{fallback_emotion_detection, EmotionAnalysis, EmotionResult};
use crate::error::PipelineError;
use crate::genai::{GenerationRequest, GenerativeModel};
use crate::prompts::{emotion_detection_system, emotion_detection_user_prompt};
use crate::retry::{Pause, RetryPolicy, TokioPause};
use std::sync::Arc;

pub struct EmotionClassifier {
    model: Arc<dyn GenerativeModel>,
    model_name: String,
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
}

impl EmotionClassifier {
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

    fn request_for(&self, text: &str) -> GenerationRequest {
        GenerationRequest {
            model: self.model_name.clone(),
            system_instruction: emotion_detection_system(),
            parts: vec![emotion_detection_user_prompt(text)],
            response_schema: Some(EmotionAnalysis::response_schema()),
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Classify `text`. Never fails: after the last failed attempt the keyword table is used.
    ///
    /// Callers reject empty input before getting here.
    pub async fn detect_emotions(&self, text: &str) -> EmotionResult {
        let request = self.request_for(text);
        let request = &request;

        match self
            .policy
            .run(self.pause.as_ref(), "Emotion detection", move |_attempt| {
                self.attempt(request)
            })
            .await
        {
            Ok(result) => {
                tracing::debug!(
                    target: "mindease::classifier",
                    dominant = %result.dominant_emotion,
                    count = result.emotions.len(),
                    "emotions detected"
                );
                result
            }
            Err(exhausted) => {
                tracing::error!(
                    target: "mindease::classifier",
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "Emotion detection failed after retries; using keyword fallback"
                );
                fallback_emotion_detection(text)
            }
        }
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<EmotionResult, PipelineError> {
        let raw = self.model.generate(request).await?;
        let analysis: EmotionAnalysis = serde_json::from_str(raw.trim())?;
        let result = analysis.validate();
        if result.emotions.is_empty() {
            return Err(PipelineError::NoKnownEmotions);
        }
        Ok(result)
    }
}
