//! Raster replay surface.
//!
//! A fixed-size RGB buffer that only ever changes by applying a
//! [`StrokeSegment`] or clearing to white. Rasterization is plain integer
//! pixel iteration with a distance test, so the same ordered sequence of
//! segments always yields the same pixels: there is no antialiasing and no
//! blending, and where segments overlap the last one applied wins.

use doodle_types::{Rgb, StrokeSegment};

/// Reference surface width (4:3).
pub const DEFAULT_WIDTH: u32 = 800;

/// Reference surface height (4:3).
pub const DEFAULT_HEIGHT: u32 = 600;

/// Error type for surface construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// Width or height is zero or above the supported maximum.
    InvalidDimensions {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::InvalidDimensions { width, height } => {
                write!(f, "invalid surface dimensions: {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for SurfaceError {}

/// A white-initialized raster of fixed dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySurface {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl ReplaySurface {
    /// Largest accepted width or height.
    /// Bounds the allocation a peer-supplied size can cause.
    pub const MAX_DIMENSION: u32 = 4096;

    /// Create a blank white surface.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        if width == 0 || height == 0 || width > Self::MAX_DIMENSION || height > Self::MAX_DIMENSION
        {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![Rgb::WHITE; width as usize * height as usize],
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reset every pixel to white.
    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::WHITE);
    }

    /// Whether every pixel is white.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| *p == Rgb::WHITE)
    }

    /// Color at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Draw one segment with round caps.
    ///
    /// Every pixel whose center lies within half the effective width of the
    /// segment is overwritten with the segment's ink. Erase segments paint
    /// white at twice the nominal width. Parts outside the surface are
    /// clipped.
    pub fn apply(&mut self, segment: &StrokeSegment) {
        let half = segment.effective_width() / 2.0;
        let reach_sq = half * half;
        let ink = segment.ink();
        let (x0, y0) = segment.from_point();
        let (x1, y1) = segment.to_point();

        let min_x = (x0.min(x1) - half).floor().max(0.0);
        let min_y = (y0.min(y1) - half).floor().max(0.0);
        let max_x = (x0.max(x1) + half).ceil().min(self.width as f32 - 1.0);
        let max_y = (y0.max(y1) + half).ceil().min(self.height as f32 - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for py in min_y as u32..=max_y as u32 {
            for px in min_x as u32..=max_x as u32 {
                let cx = px as f32 + 0.5;
                let cy = py as f32 + 0.5;
                if distance_sq_to_segment(cx, cy, x0, y0, x1, y1) <= reach_sq {
                    let index = self.index(px, py);
                    self.pixels[index] = ink;
                }
            }
        }
    }

    /// FNV-1a hash of the pixel buffer.
    ///
    /// Cheap equality check between two participants' surfaces.
    pub fn checksum(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = OFFSET;
        for byte in self.rgb_bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
        hash
    }

    /// Binary PPM (P6) image of the surface, for debugging dumps.
    pub fn to_ppm(&self) -> Vec<u8> {
        let header = format!("P6\n{} {}\n255\n", self.width, self.height);
        let mut out = Vec::with_capacity(header.len() + self.pixels.len() * 3);
        out.extend_from_slice(header.as_bytes());
        out.extend(self.rgb_bytes());
        out
    }

    fn rgb_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b])
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn distance_sq_to_segment(px: f32, py: f32, x0: f32, y0: f32, x1: f32, y1: f32) -> f32 {
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let ex = px - (x0 + t * dx);
    let ey = py - (y0 + t * dy);
    ex * ex + ey * ey
}
