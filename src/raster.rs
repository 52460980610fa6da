use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use sha2::{Digest as _, Sha256};

use crate::color::Palette;
use crate::error::GradientError;
use crate::field::{ClampMode, FieldSynthesizer, ProjectionRange};
use crate::params::ParameterSet;

pub const CHANNELS: usize = 4;

/// Row-major RGBA8 pixel buffer with a fixed stride of `width * 4`.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl Raster {
    /// Zero-filled raster.
    pub fn new(width: u32, height: u32) -> Result<Self, GradientError> {
        let len = buffer_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![0_u8; len],
        })
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, GradientError> {
        let expected = buffer_len(width, height)?;
        if pixels.len() != expected {
            return Err(GradientError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.stride() + x as usize * CHANNELS;
        let mut out = [0_u8; 4];
        out.copy_from_slice(&self.pixels[idx..idx + CHANNELS]);
        Some(out)
    }

    pub fn sha256_hex(&self) -> String {
        Sha256::digest(&self.pixels)
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("raster buffer does not match {}x{}", self.width, self.height))
    }

    /// Encodes as PNG, creating parent directories as needed.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        if self.is_empty() {
            return Err(anyhow!(
                "cannot encode an empty {}x{} raster to {}",
                self.width,
                self.height,
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create output dir {}", parent.display()))?;
            }
        }
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("failed to encode PNG {}", path.display()))
    }
}

fn buffer_len(width: u32, height: u32) -> Result<usize, GradientError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
        .ok_or(GradientError::DimensionsOverflow)
}

/// Renders one raster: projection range once, then every pixel row by row.
///
/// A zero width or height yields an empty raster without evaluating the field.
pub fn synthesize_raster(
    params: &ParameterSet,
    palette: &Palette,
    width: u32,
    height: u32,
    clamp: ClampMode,
) -> Result<Raster, GradientError> {
    let mut raster = Raster::new(width, height)?;
    if raster.is_empty() {
        return Ok(raster);
    }

    let range = ProjectionRange::from_corners(params.dx, params.dy, width, height);
    let field = FieldSynthesizer::new(*params, palette.stops(params.color_order), range, clamp);

    let stride = raster.stride();
    for (y, row) in raster.pixels_mut().chunks_exact_mut(stride).enumerate() {
        field.fill_row(y as u32, row);
    }
    Ok(raster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::digest::Digest;
    use crate::params::{derive_parameters, SeedOverrides, SeedSet};

    #[test]
    fn synthesis_is_byte_identical_across_runs() {
        let params = derive_parameters(&Digest::of_str("determinism"), 64, 48);
        let a = synthesize_raster(&params, &Palette::DEFAULT, 64, 48, ClampMode::Hard).unwrap();
        let b = synthesize_raster(&params, &Palette::DEFAULT, 64, 48, ClampMode::Hard).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.pixels().len(), 64 * 48 * 4);
    }

    #[test]
    fn alpha_is_always_opaque() {
        let params = derive_parameters(&Digest::of_str("alpha"), 33, 17);
        let raster =
            synthesize_raster(&params, &Palette::EARTH, 33, 17, ClampMode::Smoothstep).unwrap();
        assert!(raster.pixels().chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn zero_sized_rasters_are_empty() {
        let params = derive_parameters(&Digest::of_str("empty"), 0, 10);
        for (w, h) in [(0, 10), (10, 0), (0, 0)] {
            let raster = synthesize_raster(&params, &Palette::DEFAULT, w, h, ClampMode::Hard)
                .expect("empty raster is valid");
            assert!(raster.is_empty());
            assert_eq!(raster.dimensions(), (w, h));
        }
    }

    #[test]
    fn pixels_only_use_palette_segments() {
        // Linear gradient (no warp, no hill) along +x with a flat palette.
        let seeds = SeedSet::from_digest(&Digest::of_str("flat")).with_overrides(&SeedOverrides {
            angle: Some(0.0),
            warp_amp_x: Some(0.0),
            warp_amp_y: Some(0.0),
            hill_amp: Some(0.0),
            color_order: Some(0),
            ..SeedOverrides::default()
        });
        let params = ParameterSet::from_seeds(seeds, 100, 4);
        let palette = Palette::new(Rgb::new(0, 0, 0), Rgb::new(100, 100, 100), Rgb::new(200, 200, 200));
        let raster = synthesize_raster(&params, &palette, 100, 4, ClampMode::Hard).unwrap();

        assert_eq!(raster.pixel(0, 0), Some([0, 0, 0, 255]));
        let mut previous = 0;
        for x in 0..100 {
            let [r, g, b, _] = raster.pixel(x, 2).unwrap();
            assert_eq!((r, g, b), (r, r, r));
            assert!(r >= previous, "gradient along +x must not decrease");
            previous = r;
        }
        // 1.1 headroom keeps the right edge short of the last stop.
        assert!(previous < 200);
        assert_eq!(raster.pixel(100, 0), None);
    }

    #[test]
    fn png_round_trips_through_image_crate() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("nested/out.png");
        let params = derive_parameters(&Digest::of_str("png"), 16, 9);
        let raster = synthesize_raster(&params, &Palette::BLUE, 16, 9, ClampMode::Hard).unwrap();
        raster.save_png(&path).expect("png should save");

        let decoded = image::open(&path).expect("png should decode").to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 9));
        assert_eq!(decoded.as_raw().as_slice(), raster.pixels());
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(Raster::from_pixels(2, 2, vec![0; 16]).is_ok());
        assert!(Raster::from_pixels(2, 2, vec![0; 15]).is_err());
    }
}
