//! Video capture seam.
//!
//! A [`CaptureDevice`] hands out at most one live [`CaptureStream`] per
//! session. The stream is shared by the render loop and the analysis
//! sampler, so every method takes `&self`.

use std::sync::Arc;

use async_trait::async_trait;
use vigil_core::frame::{FrameBuffer, Resolution};

pub mod pattern;

pub use pattern::PatternCamera;

/// Why a capture device could not be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The user or platform refused camera access.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// No device, device busy, or any other acquisition failure.
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    /// The stream was read after it had been released.
    #[error("Capture stream released")]
    Released,
}

impl CaptureError {
    /// Message suitable for showing to the person operating the monitor.
    pub fn user_message(&self) -> String {
        match self {
            CaptureError::PermissionDenied => {
                "Camera access was denied. Allow camera access and start monitoring again."
                    .to_string()
            }
            CaptureError::Unavailable(reason) => {
                format!("Could not access the camera: {reason}")
            }
            CaptureError::Released => "The camera stream has stopped.".to_string(),
        }
    }
}

/// Something that can grant exclusive access to a video source.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open the device, asking for `preferred` resolution.
    async fn acquire(&self, preferred: Resolution) -> Result<Arc<dyn CaptureStream>, CaptureError>;
}

/// A live, exclusively held video stream.
pub trait CaptureStream: Send + Sync {
    /// Resolution the device reports, if it reports one.
    fn reported_resolution(&self) -> Option<Resolution>;

    /// Copy the current frame into `dst`, reshaping it to the stream's
    /// frame size.
    fn read_frame(&self, dst: &mut FrameBuffer) -> Result<(), CaptureError>;

    /// Give the device back. Further reads fail with
    /// [`CaptureError::Released`]. Releasing twice is harmless.
    fn release(&self);
}

/// Resolution to size surfaces and snapshots with: the reported one,
/// or 640x480 when the device reports nothing usable.
pub fn effective_resolution(stream: &dyn CaptureStream) -> Resolution {
    stream
        .reported_resolution()
        .and_then(|reported| match Resolution::new(reported.width, reported.height) {
            Ok(valid) => Some(valid),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring reported capture resolution");
                None
            }
        })
        .unwrap_or_default()
}
