//! Rectangular pixel regions and the proportional face region.

use crate::frame::Resolution;

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The region assumed to bound the subject's face in a frame of the
    /// given size: `x = 0.25w`, `y = 0.05h`, `width = 0.5w`,
    /// `height = 0.45h`, each floored.
    ///
    /// Computed in integer arithmetic so the floors are exact.
    pub fn face(resolution: Resolution) -> Self {
        let w = u64::from(resolution.width);
        let h = u64::from(resolution.height);
        Self {
            x: (w / 4) as u32,
            y: (h / 20) as u32,
            width: (w / 2) as u32,
            height: (h * 9 / 20) as u32,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn contains_point(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether the whole region lies within `[0, width) x [0, height)`.
    pub fn fits_within(&self, resolution: Resolution) -> bool {
        self.right() <= resolution.width && self.bottom() <= resolution.height
    }

    /// Intersect with the frame bounds.
    pub fn clip_to(&self, resolution: Resolution) -> Self {
        let x = self.x.min(resolution.width);
        let y = self.y.min(resolution.height);
        Self {
            x,
            y,
            width: self.right().min(resolution.width) - x,
            height: self.bottom().min(resolution.height) - y,
        }
    }

    /// Partition into non-overlapping `side x side` tiles in row-major
    /// order. Tiles on the right and bottom edges are clipped to the
    /// region rather than padded.
    pub fn tiles(self, side: u32) -> impl Iterator<Item = Region> {
        let side = side.max(1);
        let cols = self.width.div_ceil(side);
        let rows = self.height.div_ceil(side);
        (0..rows).flat_map(move |row| {
            (0..cols).map(move |col| {
                let x = self.x + col * side;
                let y = self.y + row * side;
                Region {
                    x,
                    y,
                    width: side.min(self.right() - x),
                    height: side.min(self.bottom() - y),
                }
            })
        })
    }
}
