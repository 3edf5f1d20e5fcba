//! The monitoring client's orchestrator.
//!
//! [`Monitor`] owns the session lifecycle and the shared view state
//! (indicators, status badge and alert feed). Starting a session
//! acquires the camera and spawns the render loop and the analysis
//! sampler under a fresh [`SessionScope`]. The alert and status poller
//! is global: it runs from [`Monitor::launch`] until shutdown whether or
//! not a session is active.
//!
//! Results from session-scoped requests are applied only while their
//! generation is still current, so a response that arrives after stop
//! can never overwrite the reset indicators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use vigil_client::MonitorBackend;
use vigil_core::alert::AlertFeed;
use vigil_core::analysis::AnalysisResult;
use vigil_core::frame::Resolution;
use vigil_core::indicator::IndicatorPanel;
use vigil_core::status::StatusIndicator;

use crate::capture::{effective_resolution, CaptureDevice, CaptureError, CaptureStream};
use crate::config::AgentConfig;
use crate::render::RenderLoop;
use crate::sampler::Snapshotter;
use crate::scheduler::{Generation, Scheduler, SessionScope};
use crate::surface::Surface;

/// Coarse session state, for callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Starting,
    Active,
}

/// What [`Monitor::start_session`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        generation: Generation,
        resolution: Resolution,
    },
    /// A session was already starting or running; nothing changed.
    AlreadyActive,
    /// Stop was requested while the camera was being acquired. The
    /// stream was released and the monitor is idle again.
    Cancelled,
}

struct ActiveSession {
    stream: Arc<dyn CaptureStream>,
    scope: SessionScope,
}

enum Session {
    Idle,
    Starting { stop_requested: bool },
    Active(ActiveSession),
}

impl Session {
    fn phase(&self) -> SessionPhase {
        match self {
            Session::Idle => SessionPhase::Idle,
            Session::Starting { .. } => SessionPhase::Starting,
            Session::Active(_) => SessionPhase::Active,
        }
    }
}

pub struct Monitor {
    config: AgentConfig,
    device: Arc<dyn CaptureDevice>,
    backend: Arc<dyn MonitorBackend>,
    surface: Arc<dyn Surface>,
    scheduler: Scheduler,
    snapshotter: Snapshotter,
    launched: AtomicBool,
    session: Mutex<Session>,
    indicators: RwLock<IndicatorPanel>,
    status: RwLock<StatusIndicator>,
    feed: RwLock<AlertFeed>,
}

impl Monitor {
    pub fn new(
        config: AgentConfig,
        device: Arc<dyn CaptureDevice>,
        backend: Arc<dyn MonitorBackend>,
        surface: Arc<dyn Surface>,
    ) -> Arc<Self> {
        let snapshotter = Snapshotter::new(config.mask_outbound_frames, config.snapshot_quality);
        Arc::new(Self {
            config,
            device,
            backend,
            surface,
            scheduler: Scheduler::new(),
            snapshotter,
            launched: AtomicBool::new(false),
            session: Mutex::new(Session::Idle),
            indicators: RwLock::new(IndicatorPanel::baseline()),
            status: RwLock::new(StatusIndicator::default()),
            feed: RwLock::new(AlertFeed::Empty),
        })
    }

    // -----------------------------------------------------------------------
    // Global polling
    // -----------------------------------------------------------------------

    /// Start the alert feed and status poller. Its first tick runs
    /// immediately, which doubles as the initial fetch. Calling this
    /// again returns `None`.
    pub fn launch(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.launched.swap(true, Ordering::AcqRel) {
            return None;
        }
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            alert_limit = self.config.alert_limit,
            "Starting alert and status polling"
        );

        let monitor = Arc::clone(self);
        Some(self.scheduler.spawn_periodic(
            "alerts+status",
            self.config.poll_interval,
            self.scheduler.global_token(),
            move || {
                let monitor = Arc::clone(&monitor);
                async move {
                    tokio::join!(monitor.refresh_alerts(), monitor.refresh_status());
                }
            },
        ))
    }

    /// Fetch the alert history and redraw the feed. On failure the
    /// previous feed is kept.
    pub async fn refresh_alerts(&self) -> bool {
        match self.backend.list_alerts(self.config.alert_limit).await {
            Ok(alerts) => {
                let feed = AlertFeed::from_alerts(alerts);
                let mut current = self.feed.write().await;
                self.surface.show_alerts(&feed);
                *current = feed;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch alerts");
                false
            }
        }
    }

    /// Fetch the service's monitoring flag and mirror it locally.
    pub async fn refresh_status(&self) -> bool {
        match self.backend.status().await {
            Ok(status) => {
                self.publish_status(status.into()).await;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch system status");
                false
            }
        }
    }

    /// Ask the service to clear its alerts, then refetch the feed
    /// whether or not the clear succeeded.
    pub async fn clear_alerts(&self) {
        match self.backend.clear_alerts().await {
            Ok(()) => tracing::info!("Alerts cleared"),
            Err(e) => tracing::error!(error = %e, "Failed to clear alerts"),
        }
        self.refresh_alerts().await;
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Acquire the camera and start the render loop and analysis sampler.
    ///
    /// A call made while a session is starting or active does nothing.
    /// If the camera cannot be acquired the monitor stays idle, the
    /// failure is shown on the surface and returned. A stop that lands
    /// during acquisition releases the new stream before anything runs.
    pub async fn start_session(self: &Arc<Self>) -> Result<StartOutcome, CaptureError> {
        {
            let mut session = self.session.lock().await;
            if !matches!(*session, Session::Idle) {
                tracing::debug!(phase = ?session.phase(), "Start ignored, session already in progress");
                return Ok(StartOutcome::AlreadyActive);
            }
            *session = Session::Starting {
                stop_requested: false,
            };
        }

        let stream = match self.device.acquire(self.config.capture_resolution).await {
            Ok(stream) => stream,
            Err(e) => {
                *self.session.lock().await = Session::Idle;
                tracing::error!(error = %e, "Camera acquisition failed");
                self.surface.show_error(&e.user_message());
                return Err(e);
            }
        };

        let mut session = self.session.lock().await;
        let stop_requested = matches!(
            *session,
            Session::Starting {
                stop_requested: true
            }
        );
        if stop_requested || self.scheduler.is_shut_down() {
            stream.release();
            *session = Session::Idle;
            if stop_requested {
                tracing::info!("Session stopped while acquiring the camera");
                return Ok(StartOutcome::Cancelled);
            }
            return Err(CaptureError::Unavailable("monitor is shutting down".into()));
        }

        let resolution = effective_resolution(stream.as_ref());
        let scope = self.scheduler.open_session();
        self.spawn_render_loop(&scope, Arc::clone(&stream), resolution);
        self.spawn_sampler(&scope, Arc::clone(&stream));

        let generation = scope.generation();
        *session = Session::Active(ActiveSession { stream, scope });
        drop(session);

        tracing::info!(
            generation,
            %resolution,
            masked_snapshots = self.snapshotter.masks_faces(),
            "Monitoring session started"
        );
        self.set_monitoring(true).await;

        Ok(StartOutcome::Started {
            generation,
            resolution,
        })
    }

    /// Stop the active session: cancel its tasks, release the camera and
    /// reset the indicators. A stop during acquisition is recorded and
    /// honoured by the pending [`start_session`](Self::start_session).
    /// Returns `false` if the monitor was idle.
    pub async fn stop_session(&self) -> bool {
        let active = {
            let mut session = self.session.lock().await;
            match std::mem::replace(&mut *session, Session::Idle) {
                Session::Active(active) => active,
                Session::Starting { .. } => {
                    *session = Session::Starting {
                        stop_requested: true,
                    };
                    tracing::debug!("Stop requested while camera acquisition is pending");
                    return true;
                }
                Session::Idle => return false,
            }
        };

        self.scheduler.close_session(&active.scope);
        active.stream.release();

        {
            let mut indicators = self.indicators.write().await;
            *indicators = IndicatorPanel::baseline();
            self.surface.show_indicators(&indicators);
        }

        tracing::info!(generation = active.scope.generation(), "Monitoring session stopped");
        self.set_monitoring(false).await;
        true
    }

    fn spawn_render_loop(
        &self,
        scope: &SessionScope,
        stream: Arc<dyn CaptureStream>,
        resolution: Resolution,
    ) {
        let mut render = RenderLoop::new(stream, Arc::clone(&self.surface), resolution);
        self.scheduler.spawn_periodic(
            "render",
            self.config.frame_interval(),
            scope.token(),
            move || {
                render.tick();
                std::future::ready(())
            },
        );
    }

    fn spawn_sampler(self: &Arc<Self>, scope: &SessionScope, stream: Arc<dyn CaptureStream>) {
        let monitor = Arc::clone(self);
        let generation = scope.generation();
        self.scheduler.spawn_periodic(
            "analysis",
            self.config.analysis_interval,
            scope.token(),
            move || {
                let monitor = Arc::clone(&monitor);
                let stream = Arc::clone(&stream);
                async move {
                    monitor.analyze_once(generation, stream.as_ref()).await;
                }
            },
        );
    }

    /// One sampler tick: snapshot, analyse, apply. Failures are logged
    /// and the indicators keep their last values.
    async fn analyze_once(&self, generation: Generation, stream: &dyn CaptureStream) -> bool {
        let image = match self.snapshotter.capture(stream) {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot failed, skipping analysis tick");
                return false;
            }
        };

        match self.backend.analyze(&image).await {
            Ok(result) => self.apply_analysis(generation, &result).await,
            Err(e) => {
                tracing::warn!(error = %e, "Analysis request failed, skipping tick");
                false
            }
        }
    }

    /// Replace the indicators with `result` if `generation` is still the
    /// live session. The check happens under the indicator lock so it
    /// cannot interleave with the reset in [`stop_session`](Self::stop_session).
    async fn apply_analysis(&self, generation: Generation, result: &AnalysisResult) -> bool {
        let mut indicators = self.indicators.write().await;
        if !self.scheduler.is_current(generation) {
            tracing::debug!(generation, "Discarding analysis result from a finished session");
            return false;
        }
        *indicators = IndicatorPanel::from_result(result);
        self.surface.show_indicators(&indicators);
        if result.any_flag() {
            tracing::info!(
                fall = result.fall_detected,
                aggression = result.aggression,
                risky = result.risky_behavior,
                "Analysis flagged activity"
            );
        }
        true
    }

    /// Show the new badge straight away and tell the service in the
    /// background. A failed toggle is logged, not rolled back.
    async fn set_monitoring(&self, active: bool) {
        self.publish_status(StatusIndicator::new(active)).await;

        let backend = Arc::clone(&self.backend);
        self.scheduler.spawn("status-toggle", async move {
            if let Err(e) = backend.toggle_status(active).await {
                tracing::warn!(error = %e, active, "Failed to sync monitoring status");
            }
        });
    }

    async fn publish_status(&self, status: StatusIndicator) {
        let mut current = self.status.write().await;
        *current = status;
        self.surface.show_status(status);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub async fn phase(&self) -> SessionPhase {
        self.session.lock().await.phase()
    }

    pub fn current_generation(&self) -> Generation {
        self.scheduler.current_generation()
    }

    pub async fn indicators(&self) -> IndicatorPanel {
        self.indicators.read().await.clone()
    }

    pub async fn status(&self) -> StatusIndicator {
        *self.status.read().await
    }

    pub async fn alert_feed(&self) -> AlertFeed {
        self.feed.read().await.clone()
    }

    /// Tasks still running (pollers, session loops, pending toggles).
    pub fn running_tasks(&self) -> usize {
        self.scheduler.running_tasks()
    }

    /// Stop any session and every background task.
    pub async fn shutdown(&self) {
        self.stop_session().await;
        self.scheduler.shutdown().await;
        tracing::info!("Monitor shut down");
    }
}
