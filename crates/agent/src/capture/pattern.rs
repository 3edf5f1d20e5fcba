//! Synthetic capture device.
//!
//! [`PatternCamera`] produces a scrolling colour pattern so the agent
//! can run end to end on machines without a camera.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use vigil_core::frame::{FrameBuffer, Resolution, BYTES_PER_PIXEL};

use super::{CaptureDevice, CaptureError, CaptureStream};

/// A device that always grants access and renders a test pattern.
#[derive(Debug, Clone, Default)]
pub struct PatternCamera {
    /// Whether streams report their resolution back to the caller.
    hide_resolution: bool,
}

impl PatternCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// A camera whose streams do not report a resolution, like some
    /// webcams before their first frame.
    pub fn without_reported_resolution() -> Self {
        Self {
            hide_resolution: true,
        }
    }
}

#[async_trait]
impl CaptureDevice for PatternCamera {
    async fn acquire(&self, preferred: Resolution) -> Result<Arc<dyn CaptureStream>, CaptureError> {
        let resolution = if self.hide_resolution {
            Resolution::default()
        } else {
            preferred
        };
        tracing::info!(%resolution, "Pattern camera acquired");
        Ok(Arc::new(PatternStream {
            resolution,
            report_resolution: !self.hide_resolution,
            frame_index: AtomicU64::new(0),
            released: AtomicBool::new(false),
        }))
    }
}

/// Stream handed out by [`PatternCamera`].
#[derive(Debug)]
pub struct PatternStream {
    resolution: Resolution,
    report_resolution: bool,
    frame_index: AtomicU64,
    released: AtomicBool,
}

impl PatternStream {
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl CaptureStream for PatternStream {
    fn reported_resolution(&self) -> Option<Resolution> {
        self.report_resolution.then_some(self.resolution)
    }

    fn read_frame(&self, dst: &mut FrameBuffer) -> Result<(), CaptureError> {
        if self.is_released() {
            return Err(CaptureError::Released);
        }
        let shift = self.frame_index.fetch_add(1, Ordering::Relaxed) as u32;
        let width = self.resolution.width;

        dst.reshape(self.resolution);
        for (i, px) in dst.as_bytes_mut().chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            px[0] = (x.wrapping_add(shift) & 0xff) as u8;
            px[1] = (y.wrapping_add(shift / 2) & 0xff) as u8;
            px[2] = ((x ^ y) & 0xff) as u8;
            px[3] = 0xff;
        }
        Ok(())
    }

    fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            tracing::info!("Pattern camera released");
        }
    }
}
