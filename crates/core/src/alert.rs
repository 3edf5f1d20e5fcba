//! Alert history types and feed classification.
//!
//! Alerts are owned by the remote service; the client only holds the
//! most recent snapshot. [`AlertFeed::from_alerts`] turns one fetch
//! (oldest-first) into the newest-first feed that gets rendered.

use serde::{Deserialize, Serialize};

use crate::indicator::{confidence_to_percent, Tone};
use crate::types::{null_as_default, Timestamp};

/// Upper bound on alerts requested and displayed per fetch.
pub const MAX_ALERTS: usize = 20;

/// Text shown in place of the feed when the service has no alerts.
pub const NO_ALERTS_PLACEHOLDER: &str = "No alerts recorded";

/// Issue keywords tested in precedence order. The first match wins.
const KEYWORD_PRECEDENCE: [(&str, AlertKind); 4] = [
    ("Fall", AlertKind::Fall),
    ("Aggression", AlertKind::Aggression),
    ("Risky", AlertKind::Risky),
    ("Emotion", AlertKind::Emotion),
];

/// One entry of `GET /api/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub issue: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(with = "flexible_timestamp")]
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
}

/// Severity used to style a feed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Caution,
    Info,
}

impl AlertSeverity {
    pub fn tone(self) -> Tone {
        match self {
            AlertSeverity::Critical => Tone::Danger,
            AlertSeverity::Warning => Tone::Warning,
            AlertSeverity::Caution => Tone::Caution,
            AlertSeverity::Info => Tone::Info,
        }
    }
}

/// What an alert is about, derived from its issue text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Fall,
    Aggression,
    Risky,
    Emotion,
    General,
}

impl AlertKind {
    /// Classify by case-sensitive substring match against the keyword
    /// precedence list, falling back to [`AlertKind::General`].
    pub fn classify(issue: &str) -> Self {
        KEYWORD_PRECEDENCE
            .iter()
            .find(|(keyword, _)| issue.contains(keyword))
            .map(|&(_, kind)| kind)
            .unwrap_or(AlertKind::General)
    }

    pub fn severity(self) -> AlertSeverity {
        match self {
            AlertKind::Fall => AlertSeverity::Critical,
            AlertKind::Aggression => AlertSeverity::Warning,
            AlertKind::Risky => AlertSeverity::Caution,
            AlertKind::Emotion | AlertKind::General => AlertSeverity::Info,
        }
    }

    /// Icon name for the entry.
    pub fn icon(self) -> &'static str {
        match self {
            AlertKind::Fall => "person-falling",
            AlertKind::Aggression => "hand-fist",
            AlertKind::Risky => "triangle-exclamation",
            AlertKind::Emotion => "face-meh",
            AlertKind::General => "circle-info",
        }
    }
}

/// A classified alert ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEntry {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub issue: String,
    pub confidence_percent: u8,
    pub timestamp: Timestamp,
    pub action: String,
}

impl AlertEntry {
    pub fn from_alert(alert: Alert) -> Self {
        let kind = AlertKind::classify(&alert.issue);
        Self {
            kind,
            severity: kind.severity(),
            confidence_percent: confidence_to_percent(Some(alert.confidence), 0),
            issue: alert.issue,
            timestamp: alert.timestamp,
            action: alert.action,
        }
    }

    /// Wall-clock time of day the alert was raised.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Rendered alert history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "entries", rename_all = "lowercase")]
pub enum AlertFeed {
    /// Nothing to show; render [`NO_ALERTS_PLACEHOLDER`].
    #[default]
    Empty,
    /// Newest first, at most [`MAX_ALERTS`] entries.
    Entries(Vec<AlertEntry>),
}

impl AlertFeed {
    /// Build the feed from one service snapshot given oldest-first.
    ///
    /// Keeps the newest [`MAX_ALERTS`] alerts and reverses them.
    pub fn from_alerts(alerts: Vec<Alert>) -> Self {
        if alerts.is_empty() {
            return AlertFeed::Empty;
        }
        let skip = alerts.len().saturating_sub(MAX_ALERTS);
        let entries = alerts
            .into_iter()
            .skip(skip)
            .rev()
            .map(AlertEntry::from_alert)
            .collect();
        AlertFeed::Entries(entries)
    }

    pub fn entries(&self) -> &[AlertEntry] {
        match self {
            AlertFeed::Empty => &[],
            AlertFeed::Entries(entries) => entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Accepts RFC 3339, naive ISO-8601 (read as UTC) or epoch seconds.
mod flexible_timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::types::Timestamp;

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Epoch(f64),
    }

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => parse(&text)
                .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: {text}"))),
            Raw::Epoch(secs) => Utc
                .timestamp_millis_opt((secs * 1000.0) as i64)
                .single()
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {secs}"))),
        }
    }

    pub(super) fn parse(text: &str) -> Option<Timestamp> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}
