//! Per-pixel field evaluation: domain warp, gradient projection, hill wave,
//! clamp, and two-segment color interpolation.

use serde::{Deserialize, Serialize};

use crate::color::{ColorStops, Rgb};
use crate::params::ParameterSet;

/// Headroom added to the corner-derived projection span so warped samples
/// past the corners still interpolate.
const RANGE_HEADROOM: f64 = 1.1;

/// How the combined field value is pulled back into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampMode {
    #[default]
    Hard,
    Smoothstep,
}

impl ClampMode {
    pub fn from_smoothstep(use_smoothstep: bool) -> Self {
        if use_smoothstep {
            Self::Smoothstep
        } else {
            Self::Hard
        }
    }

    #[inline(always)]
    pub fn apply(self, raw: f64) -> f64 {
        let clamped = raw.min(1.0).max(0.0);
        match self {
            Self::Hard => clamped,
            Self::Smoothstep => clamped * clamped * (3.0 - 2.0 * clamped),
        }
    }
}

/// Normalization range of the unwarped linear gradient over one raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionRange {
    pub min: f64,
    pub max: f64,
    /// Divisor used for normalization: `(max - min) * 1.1`, or exactly `1.0`
    /// when the corners project to a single value.
    pub span: f64,
}

impl ProjectionRange {
    pub fn from_corners(dx: f64, dy: f64, width: u32, height: u32) -> Self {
        let w = f64::from(width);
        let h = f64::from(height);
        let mut min = f64::MAX;
        let mut max = -f64::MAX;
        for (x, y) in [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)] {
            let proj = x * dx + y * dy;
            min = min.min(proj);
            max = max.max(proj);
        }

        let raw = max - min;
        let span = if raw == 0.0 { 1.0 } else { raw * RANGE_HEADROOM };
        Self { min, max, span }
    }

    #[inline(always)]
    pub fn normalize(&self, proj: f64) -> f64 {
        (proj - self.min) / self.span
    }
}

/// Everything needed to color any pixel of one raster. Built once per
/// raster, then shared read-only.
#[derive(Debug, Clone, Copy)]
pub struct FieldSynthesizer {
    params: ParameterSet,
    stops: ColorStops,
    range: ProjectionRange,
    clamp: ClampMode,
}

impl FieldSynthesizer {
    pub fn new(
        params: ParameterSet,
        stops: ColorStops,
        range: ProjectionRange,
        clamp: ClampMode,
    ) -> Self {
        Self {
            params,
            stops,
            range,
            clamp,
        }
    }

    pub fn range(&self) -> ProjectionRange {
        self.range
    }

    /// X displacement depends only on the row.
    #[inline(always)]
    fn row_displacement(&self, fy: f64) -> f64 {
        let p = &self.params;
        p.warp_amp_x * (p.warp_freq_x * fy + p.warp_phase_x).sin()
    }

    #[inline(always)]
    fn t_with_row(&self, fx: f64, fy: f64, disp_x: f64) -> f64 {
        let p = &self.params;
        let disp_y = p.warp_amp_y * (p.warp_freq_y * fx + p.warp_phase_y).sin();

        let src_x = fx + disp_x;
        let src_y = fy + disp_y;
        let t_base = self.range.normalize(src_x * p.dx + src_y * p.dy);

        // Hill wave runs on destination coordinates, not the warped source.
        let t_wave = if p.hill_amplitude > 0.0 {
            (p.hill_freq_x * fx + p.hill_freq_y * fy + p.hill_phase).sin()
        } else {
            0.0
        };

        self.clamp.apply(t_base + p.hill_amplitude * t_wave)
    }

    /// Final field value in `[0, 1]` for pixel `(x, y)`.
    pub fn t_final(&self, x: u32, y: u32) -> f64 {
        let fy = f64::from(y);
        self.t_with_row(f64::from(x), fy, self.row_displacement(fy))
    }

    pub fn color_at(&self, x: u32, y: u32) -> Rgb {
        interpolate(&self.stops, self.t_final(x, y))
    }

    /// Writes one row of RGBA pixels (alpha opaque) into `row`, which must
    /// hold `4 * width` bytes.
    pub fn fill_row(&self, y: u32, row: &mut [u8]) {
        let fy = f64::from(y);
        let disp_x = self.row_displacement(fy);
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let t = self.t_with_row(x as f64, fy, disp_x);
            px.copy_from_slice(&interpolate(&self.stops, t).to_rgba());
        }
    }
}

/// Two-segment lerp: first..middle over `[0, 0.5)`, middle..last over
/// `[0.5, 1]`. Channels truncate toward zero.
#[inline(always)]
pub fn interpolate(stops: &ColorStops, t_final: f64) -> Rgb {
    if t_final < 0.5 {
        lerp_rgb(stops.first, stops.middle, t_final * 2.0)
    } else {
        lerp_rgb(stops.middle, stops.last, (t_final - 0.5) * 2.0)
    }
}

#[inline(always)]
fn lerp_rgb(from: Rgb, to: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp_channel(from.r, to.r, t),
        lerp_channel(from.g, to.g, t),
        lerp_channel(from.b, to.b, t),
    )
}

#[inline(always)]
fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    (f64::from(from) * (1.0 - t) + f64::from(to) * t) as u8
}
