//! Monitoring status flag mirrored from the service.

use serde::{Deserialize, Serialize};

use crate::indicator::Tone;
use crate::types::null_as_default;

/// Body of `GET /api/status`, also sent with `POST /api/status/toggle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub monitoring_active: bool,
}

/// Local status badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusIndicator {
    pub active: bool,
}

impl StatusIndicator {
    pub fn new(active: bool) -> Self {
        Self { active }
    }

    pub fn label(self) -> &'static str {
        if self.active {
            "Monitoring Active"
        } else {
            "System Ready"
        }
    }

    pub fn tone(self) -> Tone {
        if self.active {
            Tone::Positive
        } else {
            Tone::Neutral
        }
    }
}

impl From<SystemStatus> for StatusIndicator {
    fn from(status: SystemStatus) -> Self {
        Self::new(status.monitoring_active)
    }
}
