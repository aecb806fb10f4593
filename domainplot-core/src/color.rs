//! Domain coloring: hue from the argument, lightness from the modulus.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::complex::Complex;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Color of values that are NaN or infinite, and of pixels whose
    /// evaluation failed.
    pub const UNDEFINED: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Opaque RGBA bytes.
    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// Tunables for [`domain_color`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorParams {
    /// Upper bound on lightness, reached as the modulus grows without bound.
    /// Keeps large-modulus regions from washing out to white.
    #[serde(default = "default_lightness_max")]
    pub lightness_max: f64,
}

impl ColorParams {
    pub const DEFAULT_LIGHTNESS_MAX: f64 = 0.68;

    /// Params with `lightness_max` clamped into `[0, 1]`.
    pub fn with_lightness_max(lightness_max: f64) -> Self {
        let lightness_max = if lightness_max.is_finite() {
            lightness_max.clamp(0.0, 1.0)
        } else {
            Self::DEFAULT_LIGHTNESS_MAX
        };
        Self { lightness_max }
    }
}

impl Default for ColorParams {
    fn default() -> Self {
        Self {
            lightness_max: Self::DEFAULT_LIGHTNESS_MAX,
        }
    }
}

fn default_lightness_max() -> f64 {
    ColorParams::DEFAULT_LIGHTNESS_MAX
}

/// Map a complex value to its domain-coloring color.
///
/// Hue is `(π + arg z) mod 2π`, lightness is `(1 − 2^−|z|) · lightness_max`,
/// saturation is 1. Non-finite input yields [`Rgb::UNDEFINED`].
pub fn domain_color(z: Complex, params: &ColorParams) -> Rgb {
    if !z.is_finite() {
        return Rgb::UNDEFINED;
    }
    let hue = (PI + z.arg()) % TAU;
    let lightness = (1.0 - 2f64.powf(-z.norm())) * params.lightness_max;
    hsl_to_rgb(hue, 1.0, lightness)
}

/// Convert HSL to RGB. `hue` is in radians, `saturation` and `lightness` in
/// `[0, 1]`.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let sector_pos = hue.rem_euclid(TAU) / (PI / 3.0);
    let x = chroma * (1.0 - (sector_pos % 2.0 - 1.0).abs());

    let (r, g, b) = match (sector_pos.floor() as u32) % 6 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    Rgb::new(channel(r + m), channel(g + m), channel(b + m))
}

#[inline]
fn channel(v: f64) -> u8 {
    (v * 255.0).clamp(0.0, 255.0) as u8
}
