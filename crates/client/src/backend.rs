//! The service seam the agent talks through.
//!
//! [`MonitorApi`](crate::api::MonitorApi) is the HTTP implementation;
//! tests substitute in-memory fakes.

use async_trait::async_trait;
use vigil_core::alert::Alert;
use vigil_core::analysis::AnalysisResult;
use vigil_core::status::SystemStatus;

use crate::api::MonitorApiError;

/// Operations the monitoring client needs from the remote service.
#[async_trait]
pub trait MonitorBackend: Send + Sync {
    /// Analyse one encoded snapshot.
    async fn analyze(&self, image: &str) -> Result<AnalysisResult, MonitorApiError>;

    /// Most recent alerts, oldest first, at most `limit`.
    async fn list_alerts(&self, limit: usize) -> Result<Vec<Alert>, MonitorApiError>;

    async fn clear_alerts(&self) -> Result<(), MonitorApiError>;

    async fn status(&self) -> Result<SystemStatus, MonitorApiError>;

    /// Notify the service that monitoring was switched to `monitoring_active`.
    async fn toggle_status(&self, monitoring_active: bool) -> Result<(), MonitorApiError>;
}
