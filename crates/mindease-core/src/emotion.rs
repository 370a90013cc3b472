//! Emotion vocabulary, structured-output validation and the local keyword fallback.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// At most this many labels are kept per result.
pub const MAX_EMOTIONS: usize = 3;
/// Score given to every label the model returned.
pub const DEFAULT_EMOTION_SCORE: f64 = 0.8;
/// Score given to the model's dominant label when it survived filtering.
pub const DOMINANT_EMOTION_SCORE: f64 = 0.9;
/// Score for each category matched by the keyword fallback.
pub const KEYWORD_SCORE: f64 = 0.7;
/// Score for the `calm` default when no keyword matched.
pub const NO_MATCH_SCORE: f64 = 0.5;
/// Intensity reported by the keyword fallback.
pub const FALLBACK_INTENSITY: f64 = 0.6;

/// The closed vocabulary of 22 emotion labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Love,
    Excitement,
    Calm,
    Anxiety,
    Stress,
    Hope,
    Loneliness,
    Frustration,
    Confidence,
    Shame,
    Pride,
    Gratitude,
    Curiosity,
    Boredom,
    Empathy,
    Nostalgia,
}

impl Emotion {
    /// Vocabulary in the order it is presented to the model.
    pub const ALL: [Emotion; 22] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Love,
        Emotion::Excitement,
        Emotion::Calm,
        Emotion::Anxiety,
        Emotion::Stress,
        Emotion::Hope,
        Emotion::Loneliness,
        Emotion::Frustration,
        Emotion::Confidence,
        Emotion::Shame,
        Emotion::Pride,
        Emotion::Gratitude,
        Emotion::Curiosity,
        Emotion::Boredom,
        Emotion::Empathy,
        Emotion::Nostalgia,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Joy => "joy",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Fear => "fear",
            Emotion::Surprise => "surprise",
            Emotion::Disgust => "disgust",
            Emotion::Love => "love",
            Emotion::Excitement => "excitement",
            Emotion::Calm => "calm",
            Emotion::Anxiety => "anxiety",
            Emotion::Stress => "stress",
            Emotion::Hope => "hope",
            Emotion::Loneliness => "loneliness",
            Emotion::Frustration => "frustration",
            Emotion::Confidence => "confidence",
            Emotion::Shame => "shame",
            Emotion::Pride => "pride",
            Emotion::Gratitude => "gratitude",
            Emotion::Curiosity => "curiosity",
            Emotion::Boredom => "boredom",
            Emotion::Empathy => "empathy",
            Emotion::Nostalgia => "nostalgia",
        }
    }

    /// Exact, case-sensitive lookup. Labels outside the vocabulary yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|e| e.as_str() == label)
    }

    /// Comma separated vocabulary, used in the classifier prompt.
    pub fn vocabulary_list() -> String {
        Self::ALL
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown emotion label: {s}"))
    }
}

/// Label -> score in [0, 1].
pub type EmotionScores = BTreeMap<Emotion, f64>;

/// Validated emotion judgment handed to the HTTP surface and the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub emotions: Vec<Emotion>,
    pub scores: EmotionScores,
    pub dominant_emotion: Emotion,
    pub intensity: f64,
}

/// Raw structured reply from the model, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct EmotionAnalysis {
    pub emotions: Vec<String>,
    pub dominant_emotion: String,
    pub intensity: f64,
}

impl EmotionAnalysis {
    /// JSON schema sent as `responseSchema` so the model answers in this shape.
    pub fn response_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "emotions": { "type": "ARRAY", "items": { "type": "STRING" } },
                "dominant_emotion": { "type": "STRING" },
                "intensity": { "type": "NUMBER" }
            },
            "required": ["emotions", "dominant_emotion", "intensity"]
        })
    }

    /// Filter to the vocabulary, cap at [`MAX_EMOTIONS`] in emitted order, score and clamp.
    ///
    /// The returned `emotions` may be empty when the model produced no known label; the
    /// classifier treats that as a failed attempt.
    pub fn validate(&self) -> EmotionResult {
        let mut emotions: Vec<Emotion> = Vec::with_capacity(MAX_EMOTIONS);
        for emotion in self.emotions.iter().filter_map(|l| Emotion::from_label(l)) {
            if emotions.len() == MAX_EMOTIONS {
                break;
            }
            if !emotions.contains(&emotion) {
                emotions.push(emotion);
            }
        }

        let mut scores: EmotionScores = emotions
            .iter()
            .map(|e| (*e, DEFAULT_EMOTION_SCORE))
            .collect();

        let reported = Emotion::from_label(&self.dominant_emotion);
        if let Some(dominant) = reported {
            if let Some(score) = scores.get_mut(&dominant) {
                *score = DOMINANT_EMOTION_SCORE;
            }
        }

        let dominant_emotion = reported
            .or_else(|| emotions.first().copied())
            .unwrap_or(Emotion::Calm);

        EmotionResult {
            emotions,
            scores,
            dominant_emotion,
            intensity: clamp_unit(self.intensity),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Keyword table scanned in order by the fallback.
const KEYWORD_TABLE: &[(Emotion, &[&str])] = &[
    (Emotion::Joy, &["happy", "glad", "excited", "wonderful", "great", "amazing"]),
    (Emotion::Sadness, &["sad", "depressed", "down", "upset", "hurt", "crying"]),
    (Emotion::Anxiety, &["worried", "anxious", "nervous", "stressed", "scared"]),
    (Emotion::Anger, &["angry", "mad", "frustrated", "annoyed", "furious"]),
    (Emotion::Love, &["love", "care", "appreciate", "grateful", "thankful"]),
    (Emotion::Hope, &["hope", "optimistic", "confident", "positive", "believe"]),
    (Emotion::Loneliness, &["lonely", "alone", "isolated", "empty"]),
    (Emotion::Calm, &["calm", "peaceful", "relaxed", "serene", "quiet"]),
];

/// Local, dependency-free emotion detection used once the upstream retry budget is spent.
///
/// Matching is plain substring search on the lowercased text, so "sad" also fires inside
/// "saddle". Deterministic for a given input.
pub fn fallback_emotion_detection(text: &str) -> EmotionResult {
    let lowered = text.to_lowercase();

    let emotions: Vec<Emotion> = KEYWORD_TABLE
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(emotion, _)| *emotion)
        .take(MAX_EMOTIONS)
        .collect();

    let (emotions, score) = if emotions.is_empty() {
        (vec![Emotion::Calm], NO_MATCH_SCORE)
    } else {
        (emotions, KEYWORD_SCORE)
    };

    EmotionResult {
        scores: emotions.iter().map(|e| (*e, score)).collect(),
        dominant_emotion: emotions[0],
        emotions,
        intensity: FALLBACK_INTENSITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(emotions: &[&str], dominant: &str, intensity: f64) -> EmotionAnalysis {
        EmotionAnalysis {
            emotions: emotions.iter().map(|s| s.to_string()).collect(),
            dominant_emotion: dominant.to_string(),
            intensity,
        }
    }

    #[test]
    fn vocabulary_has_22_unique_labels() {
        let mut labels: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 22);
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_label(emotion.as_str()), Some(emotion));
            assert_eq!(
                serde_json::to_value(emotion).unwrap(),
                serde_json::json!(emotion.as_str())
            );
        }
    }

    #[test]
    fn from_label_is_exact() {
        assert_eq!("joy".parse::<Emotion>(), Ok(Emotion::Joy));
        assert!("Joy".parse::<Emotion>().is_err());
        assert!(Emotion::from_label("melancholy").is_none());
    }

    #[test]
    fn validate_filters_caps_and_scores() {
        let result = analysis(
            &["melancholy", "sadness", "loneliness", "hope", "fear"],
            "loneliness",
            0.7,
        )
        .validate();

        assert_eq!(
            result.emotions,
            vec![Emotion::Sadness, Emotion::Loneliness, Emotion::Hope]
        );
        assert_eq!(result.scores[&Emotion::Sadness], DEFAULT_EMOTION_SCORE);
        assert_eq!(result.scores[&Emotion::Loneliness], DOMINANT_EMOTION_SCORE);
        assert_eq!(result.scores[&Emotion::Hope], DEFAULT_EMOTION_SCORE);
        assert_eq!(result.dominant_emotion, Emotion::Loneliness);
        assert!((result.intensity - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_dominant_falls_back_to_first_valid() {
        let result = analysis(&["anxiety", "stress"], "dread", 0.5).validate();
        assert_eq!(result.dominant_emotion, Emotion::Anxiety);
        assert!(result.scores.values().all(|s| *s == DEFAULT_EMOTION_SCORE));
    }

    #[test]
    fn dominant_outside_kept_labels_keeps_scores_untouched() {
        let result = analysis(&["joy", "hope", "love", "pride"], "pride", 0.4).validate();
        assert_eq!(result.emotions.len(), MAX_EMOTIONS);
        assert_eq!(result.dominant_emotion, Emotion::Pride);
        assert!(!result.scores.contains_key(&Emotion::Pride));
    }

    #[test]
    fn nothing_valid_defaults_dominant_to_calm() {
        let result = analysis(&["meh"], "meh", 3.0).validate();
        assert!(result.emotions.is_empty());
        assert!(result.scores.is_empty());
        assert_eq!(result.dominant_emotion, Emotion::Calm);
        assert_eq!(result.intensity, 1.0);
    }

    #[test]
    fn intensity_is_clamped() {
        assert_eq!(analysis(&["joy"], "joy", -0.3).validate().intensity, 0.0);
        assert_eq!(analysis(&["joy"], "joy", f64::NAN).validate().intensity, 0.0);
    }

    #[test]
    fn fallback_keeps_table_order() {
        let result = fallback_emotion_detection("I feel so lonely and sad today");
        assert_eq!(result.emotions, vec![Emotion::Sadness, Emotion::Loneliness]);
        assert_eq!(result.dominant_emotion, Emotion::Sadness);
        assert_eq!(result.intensity, FALLBACK_INTENSITY);
        assert_eq!(result.scores[&Emotion::Sadness], KEYWORD_SCORE);
        assert_eq!(result.scores[&Emotion::Loneliness], KEYWORD_SCORE);
    }

    #[test]
    fn fallback_without_match_is_calm() {
        let result = fallback_emotion_detection("xyz123");
        assert_eq!(result.emotions, vec![Emotion::Calm]);
        assert_eq!(result.dominant_emotion, Emotion::Calm);
        assert_eq!(result.intensity, FALLBACK_INTENSITY);
        assert_eq!(result.scores.len(), 1);
        assert_eq!(result.scores[&Emotion::Calm], NO_MATCH_SCORE);
    }

    #[test]
    fn fallback_caps_at_three_and_scores_only_kept_labels() {
        let result =
            fallback_emotion_detection("HAPPY but sad, worried and angry, still I love you");
        assert_eq!(
            result.emotions,
            vec![Emotion::Joy, Emotion::Sadness, Emotion::Anxiety]
        );
        assert_eq!(result.scores.len(), 3);
        assert!(!result.scores.contains_key(&Emotion::Anger));
    }

    #[test]
    fn scores_serialize_with_label_keys() {
        let result = fallback_emotion_detection("so peaceful");
        let json = serde_json::to_value(&result.scores).unwrap();
        assert_eq!(json, serde_json::json!({ "calm": 0.7 }));
    }
}
