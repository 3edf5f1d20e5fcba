#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::Notify;
use vigil_agent::capture::{CaptureDevice, CaptureError, CaptureStream};
use vigil_agent::config::AgentConfig;
use vigil_agent::surface::Surface;
use vigil_agent::Monitor;
use vigil_client::{MonitorApiError, MonitorBackend};
use vigil_core::alert::{Alert, AlertFeed};
use vigil_core::analysis::AnalysisResult;
use vigil_core::frame::{FrameBuffer, Resolution};
use vigil_core::indicator::IndicatorPanel;
use vigil_core::status::{StatusIndicator, SystemStatus};

/// Small frames keep the render loop cheap under a paused clock.
pub fn test_config() -> AgentConfig {
    AgentConfig {
        capture_resolution: Resolution::new(64, 48).unwrap(),
        ..AgentConfig::default()
    }
}

pub fn unavailable() -> MonitorApiError {
    MonitorApiError::ApiError {
        status: 503,
        body: "service unavailable".into(),
    }
}

pub fn alert(issue: &str, minute: u32) -> Alert {
    Alert {
        issue: issue.to_string(),
        confidence: 0.8,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 8, minute, 0).unwrap(),
        action: "Check in".to_string(),
    }
}

pub fn fall_result(confidence: f64) -> AnalysisResult {
    AnalysisResult {
        fall_detected: true,
        fall_confidence: Some(confidence),
        emotion: Some("scared".into()),
        emotion_confidence: Some(0.6),
        ..AnalysisResult::default()
    }
}

/// Let spawned tasks run without advancing the paused clock much.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub struct Harness {
    pub monitor: Arc<Monitor>,
    pub camera: Arc<FakeCamera>,
    pub backend: Arc<FakeBackend>,
    pub surface: Arc<RecordingSurface>,
}

pub fn harness(camera: Arc<FakeCamera>, backend: Arc<FakeBackend>) -> Harness {
    harness_with(test_config(), camera, backend)
}

pub fn harness_with(
    config: AgentConfig,
    camera: Arc<FakeCamera>,
    backend: Arc<FakeBackend>,
) -> Harness {
    let surface = Arc::new(RecordingSurface::default());
    let monitor = Monitor::new(config, camera.clone(), backend.clone(), surface.clone());
    Harness {
        monitor,
        camera,
        backend,
        surface,
    }
}

// ---------------------------------------------------------------------------
// Capture fakes
// ---------------------------------------------------------------------------

/// Raw pixel value the fake stream writes at `(x, y)`.
pub fn raw_pixel(x: u32, y: u32) -> [u8; 4] {
    [(x * 3) as u8, (y * 5) as u8, ((x + y) * 2) as u8, 255]
}

pub struct FakeStream {
    reported: Option<Resolution>,
    reads: AtomicUsize,
    released: AtomicBool,
}

impl FakeStream {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl CaptureStream for FakeStream {
    fn reported_resolution(&self) -> Option<Resolution> {
        self.reported
    }

    fn read_frame(&self, dst: &mut FrameBuffer) -> Result<(), CaptureError> {
        if self.is_released() {
            return Err(CaptureError::Released);
        }
        self.reads.fetch_add(1, Ordering::SeqCst);
        dst.reshape(self.reported.unwrap_or_default());
        for y in 0..dst.height() {
            for x in 0..dst.width() {
                dst.set_pixel(x, y, raw_pixel(x, y));
            }
        }
        Ok(())
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// What resolution fake streams report.
#[derive(Clone, Copy)]
pub enum Reports {
    /// Whatever the monitor asked for.
    Preferred,
    Fixed(Resolution),
    Nothing,
}

pub struct FakeCamera {
    reports: Reports,
    failure: Option<CaptureError>,
    delay: Duration,
    acquisitions: AtomicUsize,
    streams: Mutex<Vec<Arc<FakeStream>>>,
}

impl FakeCamera {
    pub fn new() -> Arc<Self> {
        Self::build(Reports::Preferred, None, Duration::ZERO)
    }

    pub fn reporting(reports: Reports) -> Arc<Self> {
        Self::build(reports, None, Duration::ZERO)
    }

    pub fn failing(error: CaptureError) -> Arc<Self> {
        Self::build(Reports::Preferred, Some(error), Duration::ZERO)
    }

    /// Acquisition takes `delay` to complete.
    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::build(Reports::Preferred, None, delay)
    }

    fn build(reports: Reports, failure: Option<CaptureError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reports,
            failure,
            delay,
            acquisitions: AtomicUsize::new(0),
            streams: Mutex::new(Vec::new()),
        })
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn last_stream(&self) -> Arc<FakeStream> {
        let streams = self.streams.lock().unwrap();
        Arc::clone(streams.last().expect("a stream was acquired"))
    }
}

#[async_trait]
impl CaptureDevice for FakeCamera {
    async fn acquire(&self, preferred: Resolution) -> Result<Arc<dyn CaptureStream>, CaptureError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let reported = match self.reports {
            Reports::Preferred => Some(preferred),
            Reports::Fixed(resolution) => Some(resolution),
            Reports::Nothing => None,
        };
        let stream = Arc::new(FakeStream {
            reported,
            reads: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        });
        self.streams.lock().unwrap().push(Arc::clone(&stream));
        Ok(stream)
    }
}

// ---------------------------------------------------------------------------
// Backend fake
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct BackendState {
    pub analysis: Option<AnalysisResult>,
    pub alerts: Vec<Alert>,
    pub status: SystemStatus,
    pub fail_alerts: bool,
    pub fail_status: bool,
    pub fail_clear: bool,
    pub fail_toggle: bool,
    /// Every call in order: "analyze", "alerts", "clear", "status", "toggle".
    pub calls: Vec<&'static str>,
    pub images: Vec<String>,
    pub alert_limits: Vec<usize>,
    pub toggles: Vec<bool>,
}

/// In-memory stand-in for the analysis service.
///
/// `analysis: None` makes analyze fail. When gated, analyze waits for
/// [`release_gate`](FakeBackend::release_gate) before answering.
#[derive(Default)]
pub struct FakeBackend {
    pub state: Mutex<BackendState>,
    gated: AtomicBool,
    gate: Notify,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with(setup: impl FnOnce(&mut BackendState)) -> Arc<Self> {
        let backend = Self::default();
        setup(&mut backend.state.lock().unwrap());
        Arc::new(backend)
    }

    pub fn update(&self, change: impl FnOnce(&mut BackendState)) {
        change(&mut self.state.lock().unwrap());
    }

    pub fn gate_analysis(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release_gate(&self) {
        self.gated.store(false, Ordering::SeqCst);
        self.gate.notify_one();
    }

    pub fn count(&self, call: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn toggles(&self) -> Vec<bool> {
        self.state.lock().unwrap().toggles.clone()
    }

    pub fn images(&self) -> Vec<String> {
        self.state.lock().unwrap().images.clone()
    }

    fn record(&self, call: &'static str) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl MonitorBackend for FakeBackend {
    async fn analyze(&self, image: &str) -> Result<AnalysisResult, MonitorApiError> {
        {
            let mut state = self.state.lock().unwrap();
            state.calls.push("analyze");
            state.images.push(image.to_string());
        }
        if self.gated.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        self.state.lock().unwrap().analysis.clone().ok_or_else(unavailable)
    }

    async fn list_alerts(&self, limit: usize) -> Result<Vec<Alert>, MonitorApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("alerts");
        state.alert_limits.push(limit);
        if state.fail_alerts {
            return Err(unavailable());
        }
        Ok(state.alerts.clone())
    }

    async fn clear_alerts(&self) -> Result<(), MonitorApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("clear");
        if state.fail_clear {
            return Err(unavailable());
        }
        state.alerts.clear();
        Ok(())
    }

    async fn status(&self) -> Result<SystemStatus, MonitorApiError> {
        self.record("status");
        let state = self.state.lock().unwrap();
        if state.fail_status {
            return Err(unavailable());
        }
        Ok(state.status)
    }

    async fn toggle_status(&self, monitoring_active: bool) -> Result<(), MonitorApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("toggle");
        state.toggles.push(monitoring_active);
        if state.fail_toggle {
            return Err(unavailable());
        }
        state.status.monitoring_active = monitoring_active;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Surface fake
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Shown {
    pub frames: usize,
    pub last_frame: Option<FrameBuffer>,
    pub indicators: Vec<IndicatorPanel>,
    pub feeds: Vec<AlertFeed>,
    pub statuses: Vec<StatusIndicator>,
    pub errors: Vec<String>,
}

#[derive(Default)]
pub struct RecordingSurface {
    pub shown: Mutex<Shown>,
}

impl RecordingSurface {
    pub fn frames(&self) -> usize {
        self.shown.lock().unwrap().frames
    }

    pub fn last_frame(&self) -> Option<FrameBuffer> {
        self.shown.lock().unwrap().last_frame.clone()
    }

    pub fn last_indicators(&self) -> Option<IndicatorPanel> {
        self.shown.lock().unwrap().indicators.last().cloned()
    }

    pub fn last_feed(&self) -> Option<AlertFeed> {
        self.shown.lock().unwrap().feeds.last().cloned()
    }

    pub fn statuses(&self) -> Vec<bool> {
        self.shown.lock().unwrap().statuses.iter().map(|s| s.active).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.shown.lock().unwrap().errors.clone()
    }
}

impl Surface for RecordingSurface {
    fn present(&self, frame: &FrameBuffer) {
        let mut shown = self.shown.lock().unwrap();
        shown.frames += 1;
        shown.last_frame = Some(frame.clone());
    }

    fn show_indicators(&self, panel: &IndicatorPanel) {
        self.shown.lock().unwrap().indicators.push(panel.clone());
    }

    fn show_alerts(&self, feed: &AlertFeed) {
        self.shown.lock().unwrap().feeds.push(feed.clone());
    }

    fn show_status(&self, status: StatusIndicator) {
        self.shown.lock().unwrap().statuses.push(status);
    }

    fn show_error(&self, message: &str) {
        self.shown.lock().unwrap().errors.push(message.to_string());
    }
}
