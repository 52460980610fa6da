//! Two-raster generation and the row-partitioned blend that merges them.

use std::num::NonZeroUsize;
use std::panic;
use std::thread;

use crate::color::Palette;
use crate::digest::{reverse_chars, Digest};
use crate::error::GradientError;
use crate::field::ClampMode;
use crate::params::{derive_parameters, ParameterSet};
use crate::raster::{synthesize_raster, Raster};

/// Renders one raster per digest on two scoped threads and waits for both.
pub fn generate_pair(
    digest_a: &Digest,
    digest_b: &Digest,
    palette: &Palette,
    width: u32,
    height: u32,
) -> Result<(Raster, Raster), GradientError> {
    generate_pair_with_clamp(digest_a, digest_b, palette, width, height, ClampMode::Hard)
}

pub fn generate_pair_with_clamp(
    digest_a: &Digest,
    digest_b: &Digest,
    palette: &Palette,
    width: u32,
    height: u32,
    clamp: ClampMode,
) -> Result<(Raster, Raster), GradientError> {
    let params_a = derive_parameters(digest_a, width, height);
    let params_b = derive_parameters(digest_b, width, height);
    synthesize_pair(&params_a, &params_b, palette, width, height, clamp)
}

/// Concurrent rendering of two already-derived parameter sets sharing one
/// palette and size. Each thread owns its own output buffer.
pub fn synthesize_pair(
    params_a: &ParameterSet,
    params_b: &ParameterSet,
    palette: &Palette,
    width: u32,
    height: u32,
    clamp: ClampMode,
) -> Result<(Raster, Raster), GradientError> {
    let (a, b) = thread::scope(|s| {
        let first = s.spawn(|| synthesize_raster(params_a, palette, width, height, clamp));
        let second = s.spawn(|| synthesize_raster(params_b, palette, width, height, clamp));
        (join_or_resume(first), join_or_resume(second))
    });
    Ok((a?, b?))
}

fn join_or_resume<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Worker count for blending: available parallelism, capped by row count.
pub fn default_blend_workers(height: u32) -> usize {
    let cores = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    cores.min(height as usize).max(1)
}

/// Per-channel truncating average of two equally sized rasters; alpha is
/// forced opaque.
pub fn blend(a: &Raster, b: &Raster) -> Result<Raster, GradientError> {
    blend_with_workers(a, b, default_blend_workers(a.height()))
}

/// Splits the output into contiguous row bands, one per worker. The last
/// band takes the remainder rows. Bands never overlap, so workers write
/// without synchronization and a single scope join ends the blend.
pub fn blend_with_workers(
    a: &Raster,
    b: &Raster,
    workers: usize,
) -> Result<Raster, GradientError> {
    if a.dimensions() != b.dimensions() {
        return Err(GradientError::DimensionMismatch {
            left: a.dimensions(),
            right: b.dimensions(),
        });
    }

    let (width, height) = a.dimensions();
    let mut out = Raster::new(width, height)?;
    if out.is_empty() {
        return Ok(out);
    }

    let workers = workers.clamp(1, height as usize);
    let stride = out.stride();
    let rows_per_worker = height as usize / workers;
    let extra_rows = height as usize % workers;
    log::debug!(
        "blending {}x{} across {} workers ({} rows each, +{} on the last)",
        width,
        height,
        workers,
        rows_per_worker,
        extra_rows
    );

    let mut bands = Vec::with_capacity(workers);
    let mut remaining = out.pixels_mut();
    let mut start_row = 0;
    for i in 0..workers {
        let rows = if i == workers - 1 {
            rows_per_worker + extra_rows
        } else {
            rows_per_worker
        };
        let (band, rest) = std::mem::take(&mut remaining).split_at_mut(rows * stride);
        bands.push((band, start_row * stride));
        remaining = rest;
        start_row += rows;
    }

    let src_a = a.pixels();
    let src_b = b.pixels();
    thread::scope(|s| {
        for (band, offset) in bands {
            s.spawn(move || {
                let len = band.len();
                blend_band(band, &src_a[offset..offset + len], &src_b[offset..offset + len]);
            });
        }
    });

    Ok(out)
}

#[inline(always)]
fn blend_band(out: &mut [u8], a: &[u8], b: &[u8]) {
    for ((dst, pa), pb) in out
        .chunks_exact_mut(4)
        .zip(a.chunks_exact(4))
        .zip(b.chunks_exact(4))
    {
        for channel in 0..3 {
            dst[channel] = ((u16::from(pa[channel]) + u16::from(pb[channel])) / 2) as u8;
        }
        dst[3] = 255;
    }
}

/// Full pipeline for one input string: SHA-256 of the input and of its
/// character-reversed form, rendered concurrently, then blended.
pub fn render_input(
    input: &str,
    palette: &Palette,
    width: u32,
    height: u32,
    clamp: ClampMode,
) -> Result<Raster, GradientError> {
    let forward = Digest::of_str(input);
    let reversed = Digest::of_str(&reverse_chars(input));
    log::info!("generating {}x{} rasters concurrently", width, height);
    let (a, b) = generate_pair_with_clamp(&forward, &reversed, palette, width, height, clamp)?;
    log::info!("blending rasters");
    blend(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterned(width: u32, height: u32, salt: usize) -> Raster {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height as usize {
            for x in 0..width as usize {
                pixels.push(((x * 17 + y * 11 + salt) & 255) as u8);
                pixels.push(((x * 7 + y * 19 + salt * 3) & 255) as u8);
                pixels.push(((x * 23 + y * 3 + salt * 5) & 255) as u8);
                pixels.push(((x * 29 + salt) & 255) as u8);
            }
        }
        Raster::from_pixels(width, height, pixels).expect("pattern length matches")
    }

    #[test]
    fn blending_with_self_keeps_colors_and_forces_alpha() {
        let raster = patterned(13, 7, 0);
        let blended = blend(&raster, &raster).expect("same size blend");
        for (out, src) in blended.pixels().chunks_exact(4).zip(raster.pixels().chunks_exact(4)) {
            assert_eq!(&out[..3], &src[..3]);
            assert_eq!(out[3], 255);
        }
    }

    #[test]
    fn blend_average_truncates_without_overflow() {
        let a = Raster::from_pixels(1, 1, vec![255, 0, 3, 0]).unwrap();
        let b = Raster::from_pixels(1, 1, vec![254, 1, 0, 0]).unwrap();
        let out = blend(&a, &b).unwrap();
        assert_eq!(out.pixels(), &[254, 0, 1, 255]);
    }

    #[test]
    fn blend_rejects_mismatched_dimensions() {
        let err = blend(&patterned(4, 4, 0), &patterned(4, 5, 0)).expect_err("sizes differ");
        assert_eq!(
            err,
            GradientError::DimensionMismatch {
                left: (4, 4),
                right: (4, 5)
            }
        );
    }

    #[test]
    fn worker_count_does_not_change_output() {
        let a = patterned(31, 23, 1);
        let b = patterned(31, 23, 9);
        let reference = blend_with_workers(&a, &b, 1).unwrap();
        for workers in [2, 3, 5, 22, 23, 64] {
            assert_eq!(
                blend_with_workers(&a, &b, workers).unwrap(),
                reference,
                "{workers} workers diverged"
            );
        }
    }

    #[test]
    fn empty_rasters_blend_to_empty() {
        let a = Raster::new(0, 5).unwrap();
        let out = blend(&a, &a).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.dimensions(), (0, 5));
    }

    #[test]
    fn default_workers_are_bounded_by_height() {
        assert_eq!(default_blend_workers(1), 1);
        assert_eq!(default_blend_workers(0), 1);
        assert!(default_blend_workers(10_000) >= 1);
    }

    #[test]
    fn pair_matches_sequential_rendering() {
        let palette = Palette::DEFAULT;
        let da = Digest::of_str("left");
        let db = Digest::of_str("tfel");
        let (a, b) = generate_pair(&da, &db, &palette, 40, 30).unwrap();

        let expect_a =
            synthesize_raster(&derive_parameters(&da, 40, 30), &palette, 40, 30, ClampMode::Hard)
                .unwrap();
        let expect_b =
            synthesize_raster(&derive_parameters(&db, 40, 30), &palette, 40, 30, ClampMode::Hard)
                .unwrap();
        assert_eq!(a, expect_a);
        assert_eq!(b, expect_b);
    }

    #[test]
    fn render_input_is_deterministic() {
        let first = render_input("hashgrad", &Palette::JAPANESE, 24, 18, ClampMode::Hard).unwrap();
        let second = render_input("hashgrad", &Palette::JAPANESE, 24, 18, ClampMode::Hard).unwrap();
        assert_eq!(first, second);
        assert_ne!(
            first,
            render_input("hashgrae", &Palette::JAPANESE, 24, 18, ClampMode::Hard).unwrap()
        );
    }
}
