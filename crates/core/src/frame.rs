//! RGBA frame buffers and capture resolutions.
//!
//! A [`FrameBuffer`] is the unit every stage of the pipeline works on:
//! the render loop copies capture frames into one, the privacy filter
//! mutates it in place, and the sampler snapshots into a fresh one.

use std::fmt;

use crate::error::CoreError;

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Width requested from the capture device when nothing else is configured.
pub const DEFAULT_WIDTH: u32 = 640;

/// Height requested from the capture device when nothing else is configured.
pub const DEFAULT_HEIGHT: u32 = 480;

/// Maximum dimension (width or height) accepted for a capture resolution.
const MAX_DIMENSION: u32 = 7680;

/// Validate that width and height are positive and within bounds.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), CoreError> {
    if width == 0 || height == 0 {
        return Err(CoreError::Validation(
            "Width and height must be greater than 0".to_string(),
        ));
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(CoreError::Validation(format!(
            "Dimensions must not exceed {MAX_DIMENSION}px (got {width}x{height})"
        )));
    }
    Ok(())
}

/// Pixel dimensions of a capture stream or display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Resolution {
    /// Build a validated resolution.
    pub fn new(width: u32, height: u32) -> Result<Self, CoreError> {
        validate_dimensions(width, height)?;
        Ok(Self { width, height })
    }

    /// Half the resolution in both dimensions, never collapsing below 1px.
    pub fn halved(self) -> Self {
        Self {
            width: (self.width / 2).max(1),
            height: (self.height / 2).max(1),
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn byte_len(self) -> usize {
        self.pixel_count() * BYTES_PER_PIXEL
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Row-major RGBA8 pixel data.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    resolution: Resolution,
    data: Vec<u8>,
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("resolution", &format_args!("{}", self.resolution))
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl FrameBuffer {
    /// Allocate a transparent black frame.
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            data: vec![0; resolution.byte_len()],
        }
    }

    /// Wrap existing RGBA8 bytes. The length must match the resolution exactly.
    pub fn from_raw(resolution: Resolution, data: Vec<u8>) -> Result<Self, CoreError> {
        let expected = resolution.byte_len();
        if data.len() != expected {
            return Err(CoreError::FrameSize {
                width: resolution.width,
                height: resolution.height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { resolution, data })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Resize the backing storage to `resolution`. Pixel contents are
    /// unspecified afterwards; callers overwrite the whole frame.
    pub fn reshape(&mut self, resolution: Resolution) {
        if self.resolution != resolution {
            self.resolution = resolution;
            self.data.resize(resolution.byte_len(), 0);
        }
    }

    /// Byte offset of pixel `(x, y)`.
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.resolution.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// Read one pixel. Panics if `(x, y)` lies outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let at = self.offset(x, y);
        [
            self.data[at],
            self.data[at + 1],
            self.data[at + 2],
            self.data[at + 3],
        ]
    }

    /// Write one pixel. Panics if `(x, y)` lies outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let at = self.offset(x, y);
        self.data[at..at + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn default_resolution_is_vga() {
        assert_eq!(Resolution::default(), Resolution { width: 640, height: 480 });
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert_matches!(Resolution::new(0, 480), Err(CoreError::Validation(_)));
        assert_matches!(Resolution::new(640, 0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn oversized_dimensions_rejected() {
        assert_matches!(Resolution::new(7681, 480), Err(CoreError::Validation(_)));
        assert!(Resolution::new(7680, 4320).is_ok());
    }

    #[test]
    fn halved_never_reaches_zero() {
        let r = Resolution { width: 1, height: 3 }.halved();
        assert_eq!(r, Resolution { width: 1, height: 1 });
        assert_eq!(Resolution::default().halved(), Resolution { width: 320, height: 240 });
    }

    #[test]
    fn from_raw_checks_length() {
        let res = Resolution { width: 2, height: 2 };
        assert!(FrameBuffer::from_raw(res, vec![0; 16]).is_ok());
        assert_matches!(
            FrameBuffer::from_raw(res, vec![0; 15]),
            Err(CoreError::FrameSize { expected: 16, actual: 15, .. })
        );
    }

    #[test]
    fn pixel_accessors_address_row_major() {
        let mut frame = FrameBuffer::new(Resolution { width: 3, height: 2 });
        frame.set_pixel(2, 1, [1, 2, 3, 4]);
        assert_eq!(frame.pixel(2, 1), [1, 2, 3, 4]);
        assert_eq!(frame.offset(2, 1), (3 + 2) * 4);
        assert_eq!(&frame.as_bytes()[20..24], &[1, 2, 3, 4]);
    }

    #[test]
    fn reshape_resizes_storage() {
        let mut frame = FrameBuffer::new(Resolution { width: 2, height: 2 });
        frame.reshape(Resolution { width: 4, height: 3 });
        assert_eq!(frame.as_bytes().len(), 48);
        assert_eq!(frame.resolution(), Resolution { width: 4, height: 3 });
    }
}
