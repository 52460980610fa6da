//! Digest bytes to gradient parameters.
//!
//! Derivation happens in two steps so callers can force individual seeds:
//! [`SeedSet::from_digest`] slices the digest into normalized seeds, then
//! [`ParameterSet::from_seeds`] maps seeds onto physical units for a given
//! raster size. [`derive_parameters`] composes the two.
//!
//! Byte layout (big-endian, each value divided by its type's max):
//!
//! | bytes | seed |
//! |-------|------|
//! | 0..8  | angle |
//! | 8..12 | warp frequency X |
//! | 12..14 | warp amplitude X |
//! | 14..16 | warp phase X |
//! | 16..20 | warp frequency Y |
//! | 20..22 | warp amplitude Y |
//! | 22..24 | warp phase Y |
//! | 24..28 | hill frequency |
//! | 28..30 | hill phase |
//! | 30 | color order (mod 6) |
//! | 31 | hill amplitude |

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::color::ColorOrder;
use crate::digest::Digest;

const TAU: f64 = 2.0 * PI;

/// Normalized seeds in `[0, 1]`, plus the raw color-order byte.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeedSet {
    pub angle: f64,
    pub warp_freq_x: f64,
    pub warp_amp_x: f64,
    pub warp_phase_x: f64,
    pub warp_freq_y: f64,
    pub warp_amp_y: f64,
    pub warp_phase_y: f64,
    pub hill_freq: f64,
    pub hill_phase: f64,
    pub hill_amp: f64,
    pub color_order_byte: u8,
}

impl SeedSet {
    pub fn from_digest(digest: &Digest) -> Self {
        Self {
            angle: digest.u64_at(0) as f64 / u64::MAX as f64,
            warp_freq_x: unit_u32(digest.u32_at(8)),
            warp_amp_x: unit_u16(digest.u16_at(12)),
            warp_phase_x: unit_u16(digest.u16_at(14)),
            warp_freq_y: unit_u32(digest.u32_at(16)),
            warp_amp_y: unit_u16(digest.u16_at(20)),
            warp_phase_y: unit_u16(digest.u16_at(22)),
            hill_freq: unit_u32(digest.u32_at(24)),
            hill_phase: unit_u16(digest.u16_at(28)),
            color_order_byte: digest.byte(30),
            hill_amp: f64::from(digest.byte(31)) / f64::from(u8::MAX),
        }
    }

    pub fn with_overrides(mut self, overrides: &SeedOverrides) -> Self {
        let slots = [
            (&mut self.angle, overrides.angle),
            (&mut self.warp_freq_x, overrides.warp_freq_x),
            (&mut self.warp_amp_x, overrides.warp_amp_x),
            (&mut self.warp_phase_x, overrides.warp_phase_x),
            (&mut self.warp_freq_y, overrides.warp_freq_y),
            (&mut self.warp_amp_y, overrides.warp_amp_y),
            (&mut self.warp_phase_y, overrides.warp_phase_y),
            (&mut self.hill_freq, overrides.hill_freq),
            (&mut self.hill_phase, overrides.hill_phase),
            (&mut self.hill_amp, overrides.hill_amp),
        ];
        for (slot, forced) in slots {
            if let Some(value) = forced {
                *slot = value;
            }
        }
        if let Some(order) = overrides.color_order {
            self.color_order_byte = order;
        }
        self
    }
}

fn unit_u32(value: u32) -> f64 {
    f64::from(value) / f64::from(u32::MAX)
}

fn unit_u16(value: u16) -> f64 {
    f64::from(value) / f64::from(u16::MAX)
}

/// Seeds to force over a digest-derived [`SeedSet`]. Unset fields keep the
/// digest's value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_freq_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_amp_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_phase_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_freq_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_amp_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_phase_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hill_freq: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hill_phase: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hill_amp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_order: Option<u8>,
}

impl SeedOverrides {
    /// Names of forced seeds that fall outside `[0, 1]` (or are NaN).
    pub fn out_of_range(&self) -> Vec<&'static str> {
        [
            ("angle", self.angle),
            ("warp_freq_x", self.warp_freq_x),
            ("warp_amp_x", self.warp_amp_x),
            ("warp_phase_x", self.warp_phase_x),
            ("warp_freq_y", self.warp_freq_y),
            ("warp_amp_y", self.warp_amp_y),
            ("warp_phase_y", self.warp_phase_y),
            ("hill_freq", self.hill_freq),
            ("hill_phase", self.hill_phase),
            ("hill_amp", self.hill_amp),
        ]
        .into_iter()
        .filter_map(|(name, value)| match value {
            Some(v) if !(0.0..=1.0).contains(&v) => Some(name),
            _ => None,
        })
        .collect()
    }
}

/// Physical gradient parameters for one raster size. Read-only once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSet {
    pub seeds: SeedSet,
    pub diagonal: f64,
    pub angle: f64,
    pub dx: f64,
    pub dy: f64,
    pub warp_freq_x: f64,
    pub warp_amp_x: f64,
    pub warp_phase_x: f64,
    pub warp_freq_y: f64,
    pub warp_amp_y: f64,
    pub warp_phase_y: f64,
    pub hill_frequency: f64,
    pub hill_freq_x: f64,
    pub hill_freq_y: f64,
    pub hill_phase: f64,
    pub hill_amplitude: f64,
    pub color_order: ColorOrder,
}

impl ParameterSet {
    pub fn from_seeds(seeds: SeedSet, width: u32, height: u32) -> Self {
        let w = f64::from(width);
        let h = f64::from(height);
        let diagonal = (w * w + h * h).sqrt();

        let angle = seeds.angle * TAU;
        let dx = angle.cos();
        let dy = angle.sin();

        let hill_frequency = cycles_to_frequency(seeds.hill_freq, diagonal);
        let hill_amplitude = if seeds.hill_amp == 0.0 {
            0.0
        } else {
            seeds.hill_amp * 0.25 + 0.05
        };

        Self {
            seeds,
            diagonal,
            angle,
            dx,
            dy,
            warp_freq_x: cycles_to_frequency(seeds.warp_freq_x, diagonal),
            warp_amp_x: warp_amplitude(seeds.warp_amp_x, diagonal),
            warp_phase_x: seeds.warp_phase_x * TAU,
            warp_freq_y: cycles_to_frequency(seeds.warp_freq_y, diagonal),
            warp_amp_y: warp_amplitude(seeds.warp_amp_y, diagonal),
            warp_phase_y: seeds.warp_phase_y * TAU,
            hill_frequency,
            hill_freq_x: hill_frequency * dx,
            hill_freq_y: hill_frequency * dy,
            hill_phase: seeds.hill_phase * TAU,
            hill_amplitude,
            color_order: ColorOrder::from_byte(seeds.color_order_byte),
        }
    }

    pub fn report(&self) -> ParameterReport {
        ParameterReport {
            seeds: self.seeds,
            diagonal: self.diagonal,
            angle_radians: self.angle,
            angle_degrees: self.angle.to_degrees(),
            dx: self.dx,
            dy: self.dy,
            warp_freq_x_cycles: seed_to_cycles(self.seeds.warp_freq_x),
            warp_freq_x: self.warp_freq_x,
            warp_amp_x: self.warp_amp_x,
            warp_phase_x: self.warp_phase_x,
            warp_freq_y_cycles: seed_to_cycles(self.seeds.warp_freq_y),
            warp_freq_y: self.warp_freq_y,
            warp_amp_y: self.warp_amp_y,
            warp_phase_y: self.warp_phase_y,
            hill_cycles: seed_to_cycles(self.seeds.hill_freq),
            hill_frequency: self.hill_frequency,
            hill_freq_x: self.hill_freq_x,
            hill_freq_y: self.hill_freq_y,
            hill_phase: self.hill_phase,
            hill_amplitude: self.hill_amplitude,
            color_order: self.color_order,
        }
    }
}

/// Seed in `[0, 1]` to 0.25..0.75 cycles across the image diagonal.
fn seed_to_cycles(seed: f64) -> f64 {
    seed * 0.5 + 0.25
}

fn cycles_to_frequency(seed: f64, diagonal: f64) -> f64 {
    seed_to_cycles(seed) * TAU / diagonal
}

fn warp_amplitude(seed: f64, diagonal: f64) -> f64 {
    if seed == 0.0 {
        return 0.0;
    }
    seed * diagonal * 0.2
}

pub fn derive_parameters(digest: &Digest, width: u32, height: u32) -> ParameterSet {
    let params = ParameterSet::from_seeds(SeedSet::from_digest(digest), width, height);
    log::debug!(
        "derived parameters for {:?} at {}x{}: angle={:.4} rad, order={}",
        digest,
        width,
        height,
        params.angle,
        params.color_order.index()
    );
    params
}

/// Flat, named view of a [`ParameterSet`] for JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterReport {
    pub seeds: SeedSet,
    pub diagonal: f64,
    pub angle_radians: f64,
    pub angle_degrees: f64,
    pub dx: f64,
    pub dy: f64,
    pub warp_freq_x_cycles: f64,
    pub warp_freq_x: f64,
    pub warp_amp_x: f64,
    pub warp_phase_x: f64,
    pub warp_freq_y_cycles: f64,
    pub warp_freq_y: f64,
    pub warp_amp_y: f64,
    pub warp_phase_y: f64,
    pub hill_cycles: f64,
    pub hill_frequency: f64,
    pub hill_freq_x: f64,
    pub hill_freq_y: f64,
    pub hill_phase: f64,
    pub hill_amplitude: f64,
    pub color_order: ColorOrder,
}
