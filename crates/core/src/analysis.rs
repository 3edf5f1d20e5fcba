//! Analysis results returned by the remote behaviour-analysis service.
//!
//! Every field is optional on the wire. Missing or `null` flags read as `false`,
//! missing confidences as `None` so indicator derivation can apply
//! per-category defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::null_as_default;

/// Emotion categories the service reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Scared,
    #[default]
    Neutral,
}

impl Emotion {
    /// All recognized emotions.
    pub const ALL: [Emotion; 5] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Scared,
        Emotion::Neutral,
    ];

    /// Parse a service label. Anything unrecognized is `Neutral`.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label))
            .unwrap_or_default()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Scared => "scared",
            Emotion::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful `POST /api/analyze` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "null_as_default")]
    pub fall_detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fall_confidence: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub aggression: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggression_confidence: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub risky_behavior: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risky_confidence: Option<f64>,
    /// Raw label; use [`AnalysisResult::emotion`] for the parsed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion_confidence: Option<f64>,
}

impl AnalysisResult {
    /// The reported emotion, `Neutral` when absent or unrecognized.
    pub fn emotion(&self) -> Emotion {
        self.emotion.as_deref().map(Emotion::parse).unwrap_or_default()
    }

    /// Whether any behavioural flag is raised.
    pub fn any_flag(&self) -> bool {
        self.fall_detected || self.aggression || self.risky_behavior
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_payload_fills_defaults() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"fall_detected": true, "fall_confidence": 0.9}"#).unwrap();

        assert!(result.fall_detected);
        assert_eq!(result.fall_confidence, Some(0.9));
        assert!(!result.aggression);
        assert_eq!(result.aggression_confidence, None);
        assert!(!result.risky_behavior);
        assert_eq!(result.emotion(), Emotion::Neutral);
        assert_eq!(result.emotion_confidence, None);
    }

    #[test]
    fn full_payload_parses() {
        let json = r#"{
            "fall_detected": false, "fall_confidence": 0.1,
            "aggression": true, "aggression_confidence": 0.75,
            "risky_behavior": true, "risky_confidence": 0.4,
            "emotion": "angry", "emotion_confidence": 0.66
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();

        assert!(result.aggression);
        assert!(result.any_flag());
        assert_eq!(result.emotion(), Emotion::Angry);
        assert_eq!(result.emotion_confidence, Some(0.66));
    }

    #[test]
    fn null_flags_read_as_false() {
        let json = r#"{
            "fall_detected": null, "fall_confidence": null,
            "aggression": null, "risky_behavior": true,
            "emotion": null
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();

        assert!(!result.fall_detected);
        assert_eq!(result.fall_confidence, None);
        assert!(!result.aggression);
        assert!(result.risky_behavior);
        assert_eq!(result.emotion(), Emotion::Neutral);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let result: AnalysisResult =
            serde_json::from_str(r#"{"emotion": "sad", "model_version": "v3"}"#).unwrap();
        assert_eq!(result.emotion(), Emotion::Sad);
    }

    #[test]
    fn emotion_parse_falls_back_to_neutral() {
        assert_eq!(Emotion::parse("happy"), Emotion::Happy);
        assert_eq!(Emotion::parse(" Scared "), Emotion::Scared);
        assert_eq!(Emotion::parse("surprised"), Emotion::Neutral);
        assert_eq!(Emotion::parse(""), Emotion::Neutral);
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let result = AnalysisResult {
            fall_detected: true,
            fall_confidence: Some(0.5),
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["fall_confidence"], 0.5);
        assert!(value.get("emotion").is_none());
        assert_eq!(value["aggression"], false);
    }
}
