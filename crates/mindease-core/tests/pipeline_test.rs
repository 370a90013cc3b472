//! Pipeline test: classifier + responder wired through `SupportPipeline` over a fake model.
//!
//! Run with: `cargo test -p mindease-core --test pipeline_test`

use async_trait::async_trait;
use mindease_core::{
    ContextTurn, Emotion, GenAiError, GenerationRequest, GenerativeModel, MindEaseConfig, Pause,
    SupportPipeline, FALLBACK_REPLY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers structured requests with `analysis` and free-text requests with `reply`.
struct FakeGemini {
    analysis: Option<String>,
    reply: Option<String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGemini {
    fn new(analysis: Option<&str>, reply: Option<&str>) -> Self {
        Self {
            analysis: analysis.map(str::to_string),
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerativeModel for FakeGemini {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenAiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().extend(request.parts.iter().cloned());
        let canned = if request.response_schema.is_some() {
            &self.analysis
        } else {
            &self.reply
        };
        canned.clone().ok_or(GenAiError::Status {
            status: 500,
            message: "INTERNAL".to_string(),
        })
    }
}

#[derive(Default)]
struct CountingPause(AtomicUsize);

#[async_trait]
impl Pause for CountingPause {
    async fn pause(&self, _delay: Duration) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn pipeline(model: Arc<FakeGemini>, pause: Arc<CountingPause>) -> SupportPipeline {
    SupportPipeline::new(model, &MindEaseConfig::default(), pause)
}

#[tokio::test]
async fn healthy_upstream_produces_model_results() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let model = Arc::new(FakeGemini::new(
        Some(r#"{"emotions":["gratitude","joy"],"dominant_emotion":"gratitude","intensity":0.6}"#),
        Some("That's lovely to hear! 🌟"),
    ));
    let pause = Arc::new(CountingPause::default());
    let pipeline = pipeline(Arc::clone(&model), Arc::clone(&pause));

    let emotions = pipeline.classifier.detect_emotions("Thank you so much").await;
    let reply = pipeline
        .responder
        .generate_response("Thank you so much", &[], "auto")
        .await;

    assert_eq!(emotions.emotions, vec![Emotion::Gratitude, Emotion::Joy]);
    assert_eq!(emotions.dominant_emotion, Emotion::Gratitude);
    assert_eq!(reply.response, "That's lovely to hear! 🌟");
    assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    assert_eq!(pause.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dead_upstream_degrades_both_components() {
    let model = Arc::new(FakeGemini::new(None, None));
    let pause = Arc::new(CountingPause::default());
    let pipeline = pipeline(Arc::clone(&model), Arc::clone(&pause));

    let emotions = pipeline.classifier.detect_emotions("xyz123").await;
    let reply = pipeline
        .responder
        .generate_response("xyz123", &[], "hinglish")
        .await;

    assert_eq!(emotions.emotions, vec![Emotion::Calm]);
    assert_eq!(emotions.scores[&Emotion::Calm], 0.5);
    assert_eq!(reply.response, FALLBACK_REPLY);
    assert_eq!(reply.detected_language, "hinglish");
    // 3 attempts each, 2 pauses each
    assert_eq!(model.calls.load(Ordering::SeqCst), 6);
    assert_eq!(pause.0.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn results_always_stay_inside_the_vocabulary() {
    let model = Arc::new(FakeGemini::new(
        Some(
            r#"{"emotions":["zen","calm","joy","hope","love"],
                "dominant_emotion":"zen","intensity":4.2}"#,
        ),
        Some("Okay."),
    ));
    let pipeline = pipeline(model, Arc::new(CountingPause::default()));

    let result = pipeline.classifier.detect_emotions("whatever").await;
    assert!((1..=3).contains(&result.emotions.len()));
    assert!(result.scores.keys().all(|k| result.emotions.contains(k)));
    assert!(result.scores.values().all(|s| (0.0..=1.0).contains(s)));
    assert!((0.0..=1.0).contains(&result.intensity));
    assert_eq!(result.dominant_emotion, Emotion::Calm);
}

#[tokio::test]
async fn long_history_is_windowed() {
    let model = Arc::new(FakeGemini::new(None, Some("I'm listening.")));
    let pipeline = pipeline(Arc::clone(&model), Arc::new(CountingPause::default()));
    let context: Vec<ContextTurn> = (0..10)
        .map(|i| ContextTurn {
            role: "user".to_string(),
            content: format!("message-{i:02}"),
        })
        .collect();

    pipeline
        .responder
        .generate_response("still here", &context, "auto")
        .await;

    let prompts = model.prompts.lock().unwrap();
    let sent = &prompts[0];
    assert_eq!(sent.matches("user: message-").count(), 4);
    assert!(sent.contains("message-06") && sent.contains("message-09"));
    assert!(!sent.contains("message-05"));
}
