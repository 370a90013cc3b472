//! Prompt templates for emotion detection and the two reply personas.

pub mod emotion_detection;
pub mod persona;

pub use emotion_detection::{emotion_detection_system, emotion_detection_user_prompt};
pub use persona::{support_user_prompt, ENGLISH_PERSONA, HINGLISH_PERSONA};
