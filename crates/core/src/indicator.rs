//! Indicator state derived from analysis results.
//!
//! [`IndicatorPanel::from_result`] is a pure function of one
//! [`AnalysisResult`]; nothing carries over between results. The
//! panel returns to [`IndicatorPanel::baseline`] whenever a session
//! stops.

use serde::Serialize;

use crate::analysis::{AnalysisResult, Emotion};

/// Bar fill used for emotion when the service omits its confidence.
pub const DEFAULT_EMOTION_FILL: u8 = 50;

/// Display categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    Fall,
    Aggression,
    Risky,
    Emotion,
}

/// Colour family used to style an indicator or status badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Danger,
    Warning,
    Caution,
    Positive,
    Info,
}

impl Tone {
    pub fn hex(self) -> &'static str {
        match self {
            Tone::Neutral => "#6b7280",
            Tone::Danger => "#ef4444",
            Tone::Warning => "#f97316",
            Tone::Caution => "#eab308",
            Tone::Positive => "#22c55e",
            Tone::Info => "#3b82f6",
        }
    }
}

/// Display state of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub kind: IndicatorKind,
    pub active: bool,
    pub label: &'static str,
    pub tone: Tone,
    /// Confidence bar fill, 0..=100.
    pub fill_percent: u8,
}

impl Indicator {
    /// Inactive, empty bar, default colour.
    pub fn baseline(kind: IndicatorKind) -> Self {
        let label = match kind {
            IndicatorKind::Emotion => emotion_label(Emotion::Neutral),
            other => flag_labels(other).1,
        };
        Self {
            kind,
            active: false,
            label,
            tone: Tone::Neutral,
            fill_percent: 0,
        }
    }

    fn flag(kind: IndicatorKind, active: bool, confidence: Option<f64>) -> Self {
        let (on, off) = flag_labels(kind);
        Self {
            kind,
            active,
            label: if active { on } else { off },
            tone: if active { flag_tone(kind) } else { Tone::Neutral },
            fill_percent: confidence_to_percent(confidence, 0),
        }
    }

    fn emotion(emotion: Emotion, confidence: Option<f64>) -> Self {
        Self {
            kind: IndicatorKind::Emotion,
            active: emotion != Emotion::Neutral,
            label: emotion_label(emotion),
            tone: emotion_tone(emotion),
            fill_percent: confidence_to_percent(confidence, DEFAULT_EMOTION_FILL),
        }
    }
}

/// The four indicators shown together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorPanel {
    pub fall: Indicator,
    pub aggression: Indicator,
    pub risky: Indicator,
    pub emotion: Indicator,
}

impl Default for IndicatorPanel {
    fn default() -> Self {
        Self::baseline()
    }
}

impl IndicatorPanel {
    pub fn baseline() -> Self {
        Self {
            fall: Indicator::baseline(IndicatorKind::Fall),
            aggression: Indicator::baseline(IndicatorKind::Aggression),
            risky: Indicator::baseline(IndicatorKind::Risky),
            emotion: Indicator::baseline(IndicatorKind::Emotion),
        }
    }

    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            fall: Indicator::flag(
                IndicatorKind::Fall,
                result.fall_detected,
                result.fall_confidence,
            ),
            aggression: Indicator::flag(
                IndicatorKind::Aggression,
                result.aggression,
                result.aggression_confidence,
            ),
            risky: Indicator::flag(
                IndicatorKind::Risky,
                result.risky_behavior,
                result.risky_confidence,
            ),
            emotion: Indicator::emotion(result.emotion(), result.emotion_confidence),
        }
    }

    pub fn is_baseline(&self) -> bool {
        *self == Self::baseline()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Indicator> {
        [&self.fall, &self.aggression, &self.risky, &self.emotion].into_iter()
    }
}

/// Map a `[0, 1]` confidence onto a `0..=100` bar fill.
///
/// Out-of-range values are clamped; `None` and NaN use `default`.
pub fn confidence_to_percent(confidence: Option<f64>, default: u8) -> u8 {
    match confidence {
        Some(c) if c.is_finite() => (c.clamp(0.0, 1.0) * 100.0).round() as u8,
        Some(_) | None => default,
    }
}

fn flag_labels(kind: IndicatorKind) -> (&'static str, &'static str) {
    match kind {
        IndicatorKind::Fall => ("Fall Detected", "No Fall"),
        IndicatorKind::Aggression => ("Aggression Detected", "No Aggression"),
        IndicatorKind::Risky => ("Risky Behavior", "No Risky Behavior"),
        IndicatorKind::Emotion => ("Emotion", "Emotion"),
    }
}

fn flag_tone(kind: IndicatorKind) -> Tone {
    match kind {
        IndicatorKind::Fall => Tone::Danger,
        IndicatorKind::Aggression => Tone::Warning,
        IndicatorKind::Risky => Tone::Caution,
        IndicatorKind::Emotion => Tone::Info,
    }
}

fn emotion_label(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "Happy",
        Emotion::Sad => "Sad",
        Emotion::Angry => "Angry",
        Emotion::Scared => "Scared",
        Emotion::Neutral => "Neutral",
    }
}

fn emotion_tone(emotion: Emotion) -> Tone {
    match emotion {
        Emotion::Happy => Tone::Positive,
        Emotion::Sad => Tone::Info,
        Emotion::Angry => Tone::Danger,
        Emotion::Scared => Tone::Warning,
        Emotion::Neutral => Tone::Neutral,
    }
}
