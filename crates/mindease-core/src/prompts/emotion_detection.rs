//! Structured emotion detection prompt. The reply shape is enforced separately through
//! `responseSchema`; this text only steers the judgment.

use crate::emotion::Emotion;

const EMOTION_DETECTION_SYSTEM_TEMPLATE: &str = r#"You are an expert emotion detection AI specialized in mental health analysis.
Analyze the emotional content of the given text and identify the emotions present.

Available emotion categories: {categories}

Provide:
1. A list of detected emotions (maximum 3 emotions from the available categories)
2. The dominant emotion (strongest one from the available categories)
3. Overall emotional intensity (0.0 to 1.0)

Be precise and consider the context of mental health conversations.
Return only valid emotions from the provided categories."#;

/// System instruction listing the full vocabulary.
pub fn emotion_detection_system() -> String {
    EMOTION_DETECTION_SYSTEM_TEMPLATE.replace("{categories}", &Emotion::vocabulary_list())
}

pub fn emotion_detection_user_prompt(text: &str) -> String {
    format!("Analyze emotions in: {text}")
}
