//! Snapshot preparation for the analysis service.
//!
//! A snapshot is read straight from the capture stream into a fresh
//! buffer, never from the display surface. Unless disabled, the face
//! region of that copy is pixelated before it is downscaled to half
//! size and JPEG-encoded as a `data:` URL.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use vigil_core::error::CoreError;
use vigil_core::frame::FrameBuffer;
use vigil_core::privacy::pixelate;
use vigil_core::region::Region;

use crate::capture::{effective_resolution, CaptureError, CaptureStream};

/// Prefix of every encoded snapshot.
pub const JPEG_DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Default JPEG quality for outbound snapshots.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("Snapshot encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Frame(#[from] CoreError),
}

/// Turns capture frames into encoded snapshots.
#[derive(Debug, Clone, Copy)]
pub struct Snapshotter {
    mask_faces: bool,
    quality: u8,
}

impl Default for Snapshotter {
    fn default() -> Self {
        Self::new(true, DEFAULT_JPEG_QUALITY)
    }
}

impl Snapshotter {
    pub fn new(mask_faces: bool, quality: u8) -> Self {
        Self {
            mask_faces,
            quality: quality.clamp(1, 100),
        }
    }

    pub fn masks_faces(&self) -> bool {
        self.mask_faces
    }

    /// Read the current frame from `stream` and encode it.
    pub fn capture(&self, stream: &dyn CaptureStream) -> Result<String, SnapshotError> {
        let mut frame = FrameBuffer::new(effective_resolution(stream));
        stream.read_frame(&mut frame)?;
        let prepared = self.prepare(frame)?;
        encode_jpeg_data_url(&prepared, self.quality)
    }

    /// Mask (if enabled) and halve a raw frame.
    pub fn prepare(&self, mut frame: FrameBuffer) -> Result<FrameBuffer, SnapshotError> {
        if self.mask_faces {
            let face = Region::face(frame.resolution());
            pixelate(&mut frame, face);
        }
        downscale_half(&frame)
    }
}

fn to_rgba_image(frame: &FrameBuffer) -> Result<RgbaImage, SnapshotError> {
    let resolution = frame.resolution();
    RgbaImage::from_raw(resolution.width, resolution.height, frame.as_bytes().to_vec()).ok_or(
        SnapshotError::Frame(CoreError::FrameSize {
            width: resolution.width,
            height: resolution.height,
            expected: resolution.byte_len(),
            actual: frame.as_bytes().len(),
        }),
    )
}

/// Resize to half width and height with bilinear filtering.
pub fn downscale_half(frame: &FrameBuffer) -> Result<FrameBuffer, SnapshotError> {
    let target = frame.resolution().halved();
    let image = to_rgba_image(frame)?;
    let scaled = imageops::resize(&image, target.width, target.height, FilterType::Triangle);
    Ok(FrameBuffer::from_raw(target, scaled.into_raw())?)
}

/// Encode `frame` as JPEG (alpha dropped) and wrap it in a `data:` URL.
pub fn encode_jpeg_data_url(frame: &FrameBuffer, quality: u8) -> Result<String, SnapshotError> {
    let rgb = DynamicImage::ImageRgba8(to_rgba_image(frame)?).into_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(&rgb)?;

    Ok(format!("{JPEG_DATA_URL_PREFIX}{}", BASE64_STANDARD.encode(jpeg)))
}

#[cfg(test)]
mod tests {
    use vigil_core::frame::Resolution;

    use super::*;
    use crate::capture::{CaptureDevice, PatternCamera};

    fn gradient(width: u32, height: u32) -> FrameBuffer {
        let mut frame = FrameBuffer::new(Resolution::new(width, height).unwrap());
        for y in 0..height {
            for x in 0..width {
                frame.set_pixel(x, y, [(x * 4) as u8, (y * 4) as u8, 128, 255]);
            }
        }
        frame
    }

    fn close(a: [u8; 4], b: [u8; 3]) -> bool {
        a.iter().zip(b).all(|(&a, b)| a.abs_diff(b) <= 1)
    }

    #[test]
    fn prepare_halves_resolution() {
        let out = Snapshotter::default().prepare(gradient(64, 48)).unwrap();
        assert_eq!(out.resolution(), Resolution::new(32, 24).unwrap());
    }

    #[test]
    fn masking_happens_before_downscale() {
        let raw = gradient(64, 64);
        // First face block of a 64x64 frame spans (16, 3) to (32, 19).
        let mean = vigil_core::privacy::block_mean(&raw, Region::new(16, 3, 16, 16));

        let masked = Snapshotter::new(true, 80).prepare(raw.clone()).unwrap();
        let unmasked = Snapshotter::new(false, 80).prepare(raw).unwrap();

        // Output (12, 5) samples source pixels 23..=27 x 9..=13, all inside that block.
        assert!(close(masked.pixel(12, 5), mean));
        assert!(!close(unmasked.pixel(12, 5), mean));
    }

    #[test]
    fn data_url_decodes_to_jpeg_of_same_size() {
        let frame = gradient(40, 30);
        let url = encode_jpeg_data_url(&frame, 80).unwrap();

        let payload = url.strip_prefix(JPEG_DATA_URL_PREFIX).expect("data URL prefix");
        let bytes = BASE64_STANDARD.decode(payload).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[tokio::test]
    async fn capture_reads_stream_and_encodes_half_size() {
        let stream = PatternCamera::new()
            .acquire(Resolution::new(64, 48).unwrap())
            .await
            .unwrap();

        let url = Snapshotter::default().capture(stream.as_ref()).unwrap();

        let bytes = BASE64_STANDARD
            .decode(url.strip_prefix(JPEG_DATA_URL_PREFIX).unwrap())
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[tokio::test]
    async fn released_stream_is_capture_error() {
        let stream = PatternCamera::new()
            .acquire(Resolution::new(8, 8).unwrap())
            .await
            .unwrap();
        stream.release();

        let err = Snapshotter::default().capture(stream.as_ref()).unwrap_err();
        assert!(matches!(err, SnapshotError::Capture(CaptureError::Released)));
    }
}
