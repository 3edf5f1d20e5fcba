//! Block-averaging privacy filter.
//!
//! The face region is partitioned into `PIXEL_BLOCK_SIZE` square
//! blocks and every pixel of a block is replaced with the block's
//! floored mean RGB. Alpha is never touched. Blocks are disjoint, so
//! each block's mean is computed from pre-filter values only and the
//! result does not depend on processing order.

use std::ops::Range;

use crate::frame::{FrameBuffer, BYTES_PER_PIXEL};
use crate::region::Region;

/// Side length, in pixels, of one pixelation block.
pub const PIXEL_BLOCK_SIZE: u32 = 16;

/// Pixelate `region` of `frame` in place with the default block size.
pub fn pixelate(frame: &mut FrameBuffer, region: Region) {
    pixelate_with_block_size(frame, region, PIXEL_BLOCK_SIZE);
}

/// Pixelate `region` of `frame` in place using `block_size` blocks.
///
/// The region is clipped to the frame first; an empty intersection is
/// a no-op.
pub fn pixelate_with_block_size(frame: &mut FrameBuffer, region: Region, block_size: u32) {
    let region = region.clip_to(frame.resolution());
    if region.is_empty() {
        return;
    }

    for block in region.tiles(block_size) {
        let mean = block_mean(frame, block);
        fill_block(frame, block, mean);
    }
}

/// Floored mean of the R, G and B channels over every pixel of `block`.
pub fn block_mean(frame: &FrameBuffer, block: Region) -> [u8; 3] {
    let count = block.area();
    if count == 0 {
        return [0; 3];
    }

    let data = frame.as_bytes();
    let mut sum = [0u64; 3];
    for span in rows(frame.width(), block) {
        for px in data[span].chunks_exact(BYTES_PER_PIXEL) {
            sum[0] += u64::from(px[0]);
            sum[1] += u64::from(px[1]);
            sum[2] += u64::from(px[2]);
        }
    }

    [
        (sum[0] / count) as u8,
        (sum[1] / count) as u8,
        (sum[2] / count) as u8,
    ]
}

fn fill_block(frame: &mut FrameBuffer, block: Region, rgb: [u8; 3]) {
    let width = frame.width();
    let data = frame.as_bytes_mut();
    for span in rows(width, block) {
        for px in data[span].chunks_exact_mut(BYTES_PER_PIXEL) {
            px[..3].copy_from_slice(&rgb);
        }
    }
}

/// Byte ranges of each row of `block` in a frame `frame_width` pixels wide.
fn rows(frame_width: u32, block: Region) -> impl Iterator<Item = Range<usize>> {
    let stride = frame_width as usize * BYTES_PER_PIXEL;
    let left = block.x as usize * BYTES_PER_PIXEL;
    let row_bytes = block.width as usize * BYTES_PER_PIXEL;
    (block.y..block.bottom()).map(move |y| {
        let start = y as usize * stride + left;
        start..start + row_bytes
    })
}
