use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Largest accepted image side, in pixels.
pub const MAX_DIMENSION: u32 = 16_384;

/// Largest accepted image area, in pixels.
pub const MAX_PIXELS: u64 = 1 << 26;

/// Reject empty images and images too large to allocate.
pub fn validate_dimensions(width: u32, height: u32) -> crate::Result<()> {
    let fits = width > 0
        && height > 0
        && width <= MAX_DIMENSION
        && height <= MAX_DIMENSION
        && width as u64 * height as u64 <= MAX_PIXELS;
    if fits {
        Ok(())
    } else {
        Err(CoreError::InvalidDimensions { width, height })
    }
}

/// The rectangle of the complex plane mapped onto an image.
///
/// Column 0 is the lower real bound and row 0 is the upper imaginary bound:
/// rows grow downward while the imaginary part grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub re_upper: f64,
    pub re_lower: f64,
    pub im_upper: f64,
    pub im_lower: f64,
}

impl Viewport {
    /// Create a viewport, rejecting non-finite bounds and empty or inverted
    /// ranges on either axis.
    pub fn new(re_upper: f64, re_lower: f64, im_upper: f64, im_lower: f64) -> crate::Result<Self> {
        for (name, v) in [
            ("re_upper", re_upper),
            ("re_lower", re_lower),
            ("im_upper", im_upper),
            ("im_lower", im_lower),
        ] {
            if !v.is_finite() {
                return Err(CoreError::InvalidViewport {
                    reason: format!("{name} must be finite, got {v}"),
                });
            }
        }
        if re_upper <= re_lower {
            return Err(CoreError::InvalidViewport {
                reason: format!("real upper bound {re_upper} must exceed lower bound {re_lower}"),
            });
        }
        if im_upper <= im_lower {
            return Err(CoreError::InvalidViewport {
                reason: format!(
                    "imaginary upper bound {im_upper} must exceed lower bound {im_lower}"
                ),
            });
        }
        let viewport = Self {
            re_upper,
            re_lower,
            im_upper,
            im_lower,
        };
        if !viewport.re_span().is_finite() || !viewport.im_span().is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: "bounds are too far apart to represent".to_string(),
            });
        }
        Ok(viewport)
    }

    /// A square viewport `[-half_extent, half_extent]²` centred on the origin.
    pub fn centered(half_extent: f64) -> crate::Result<Self> {
        Self::new(half_extent, -half_extent, half_extent, -half_extent)
    }

    pub fn re_span(&self) -> f64 {
        self.re_upper - self.re_lower
    }

    pub fn im_span(&self) -> f64 {
        self.im_upper - self.im_lower
    }

    /// Width over height of the covered region.
    pub fn aspect_ratio(&self) -> f64 {
        self.re_span() / self.im_span()
    }

    /// Image width that preserves the aspect ratio at the given height,
    /// clamped to `1..=MAX_DIMENSION`.
    pub fn export_width(&self, height: u32) -> u32 {
        let w = (height as f64 * self.aspect_ratio()).floor();
        if w.is_finite() {
            w.clamp(1.0, MAX_DIMENSION as f64) as u32
        } else {
            MAX_DIMENSION
        }
    }

    /// Map a pixel coordinate to a point on the complex plane.
    ///
    /// Takes `f64` so that cursor positions between pixel centres map
    /// exactly.
    #[inline]
    pub fn pixel_to_complex(&self, col: f64, row: f64, width: u32, height: u32) -> Complex {
        Complex::new(
            re_at_column(col, width, self.re_upper, self.re_lower),
            im_at_row(row, height, self.im_upper, self.im_lower),
        )
    }

    /// Map a point back to `(col, row)`. The result may lie outside the
    /// image; `None` for non-finite points.
    pub fn complex_to_pixel(&self, z: Complex, width: u32, height: u32) -> Option<(i64, i64)> {
        if !z.is_finite() {
            return None;
        }
        Some((
            column_of(z.re, width, self.re_upper, self.re_lower),
            row_of(z.im, height, self.im_upper, self.im_lower),
        ))
    }
}

impl Default for Viewport {
    /// `[-15, 15]` on both axes.
    fn default() -> Self {
        Self {
            re_upper: 15.0,
            re_lower: -15.0,
            im_upper: 15.0,
            im_lower: -15.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinate mapping
// ---------------------------------------------------------------------------

/// Real part at column `col` of an image `width` pixels wide.
#[inline]
pub fn re_at_column(col: f64, width: u32, re_upper: f64, re_lower: f64) -> f64 {
    re_lower + (re_upper - re_lower) * col / width as f64
}

/// Imaginary part at row `row` of an image `height` pixels tall.
#[inline]
pub fn im_at_row(row: f64, height: u32, im_upper: f64, im_lower: f64) -> f64 {
    im_upper + (im_lower - im_upper) * row / height as f64
}

/// Inverse of [`re_at_column`], floored to a whole column.
#[inline]
pub fn column_of(re: f64, width: u32, re_upper: f64, re_lower: f64) -> i64 {
    ((re - re_lower) * width as f64 / (re_upper - re_lower)).floor() as i64
}

/// Inverse of [`im_at_row`], floored to a whole row.
#[inline]
pub fn row_of(im: f64, height: u32, im_upper: f64, im_lower: f64) -> i64 {
    ((im - im_upper) * height as f64 / (im_lower - im_upper)).floor() as i64
}
