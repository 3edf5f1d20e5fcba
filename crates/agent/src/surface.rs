//! Where the monitor's output goes.
//!
//! A [`Surface`] receives masked frames, indicator updates, the alert
//! feed, the status badge and user-facing errors. [`ConsoleSurface`]
//! writes them to the log for headless runs.

use std::sync::atomic::{AtomicU64, Ordering};

use vigil_core::alert::{AlertFeed, NO_ALERTS_PLACEHOLDER};
use vigil_core::frame::FrameBuffer;
use vigil_core::indicator::IndicatorPanel;
use vigil_core::status::StatusIndicator;

/// Display sink for the monitor.
///
/// Implementations must be cheap; the render loop calls
/// [`present`](Surface::present) at the display refresh rate.
pub trait Surface: Send + Sync {
    /// Show a frame whose face region is already pixelated.
    fn present(&self, frame: &FrameBuffer);

    fn show_indicators(&self, panel: &IndicatorPanel);

    fn show_alerts(&self, feed: &AlertFeed);

    fn show_status(&self, status: StatusIndicator);

    fn show_error(&self, message: &str);
}

/// Logs everything through `tracing`.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    frames: AtomicU64,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

impl Surface for ConsoleSurface {
    fn present(&self, frame: &FrameBuffer) {
        let n = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(frame = n, resolution = %frame.resolution(), "Frame presented");
    }

    fn show_indicators(&self, panel: &IndicatorPanel) {
        tracing::info!(
            fall = panel.fall.label,
            aggression = panel.aggression.label,
            risky = panel.risky.label,
            emotion = panel.emotion.label,
            emotion_fill = panel.emotion.fill_percent,
            colors = %indicator_colors(panel),
            "Indicators updated"
        );
    }

    fn show_alerts(&self, feed: &AlertFeed) {
        match feed {
            AlertFeed::Empty => tracing::info!("{NO_ALERTS_PLACEHOLDER}"),
            AlertFeed::Entries(entries) => {
                tracing::info!(count = entries.len(), "Alert feed updated");
                for entry in entries {
                    tracing::debug!(
                        time = %entry.time_label(),
                        kind = ?entry.kind,
                        severity = ?entry.severity,
                        confidence = entry.confidence_percent,
                        action = %entry.action,
                        "{}",
                        entry.issue
                    );
                }
            }
        }
    }

    fn show_status(&self, status: StatusIndicator) {
        tracing::info!(active = status.active, color = status.tone().hex(), "{}", status.label());
    }

    fn show_error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Tone colours in panel order, e.g. `#ef4444,#6b7280,#6b7280,#6b7280`.
fn indicator_colors(panel: &IndicatorPanel) -> String {
    panel
        .iter()
        .map(|indicator| indicator.tone.hex())
        .collect::<Vec<_>>()
        .join(",")
}
