//! Capture-to-display render cycle.
//!
//! Each cycle copies the current capture frame into the loop's own
//! buffer, pixelates the face region and presents the result. The
//! buffer is reused across cycles and never shared, so nothing outside
//! this loop ever sees an unmasked frame from it.

use std::sync::Arc;

use vigil_core::frame::{FrameBuffer, Resolution};
use vigil_core::privacy::pixelate;
use vigil_core::region::Region;

use crate::capture::{CaptureError, CaptureStream};
use crate::surface::Surface;

pub struct RenderLoop {
    stream: Arc<dyn CaptureStream>,
    surface: Arc<dyn Surface>,
    frame: FrameBuffer,
    presented: u64,
}

impl RenderLoop {
    /// `resolution` sizes the display buffer up front; a stream that
    /// delivers a different size reshapes it on the first read.
    pub fn new(
        stream: Arc<dyn CaptureStream>,
        surface: Arc<dyn Surface>,
        resolution: Resolution,
    ) -> Self {
        Self {
            stream,
            surface,
            frame: FrameBuffer::new(resolution),
            presented: 0,
        }
    }

    /// Read, mask and present one frame.
    pub fn cycle(&mut self) -> Result<(), CaptureError> {
        self.stream.read_frame(&mut self.frame)?;
        let face = Region::face(self.frame.resolution());
        pixelate(&mut self.frame, face);
        self.surface.present(&self.frame);
        self.presented += 1;
        Ok(())
    }

    /// Run one cycle, logging instead of returning failures.
    pub fn tick(&mut self) {
        if let Err(e) = self.cycle() {
            tracing::debug!(error = %e, "Render cycle skipped");
        }
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented
    }
}
