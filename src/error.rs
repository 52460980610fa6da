use std::error::Error;
use std::fmt::{Display, Formatter};

/// Precondition failures raised by the gradient core.
///
/// Degenerate-but-valid inputs (zero amplitudes, empty rasters, a collapsed
/// projection range) never produce one of these; they resolve to fixed
/// fallback values instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradientError {
    DigestLength { actual: usize },
    DimensionMismatch { left: (u32, u32), right: (u32, u32) },
    DimensionsOverflow,
    BufferLength { expected: usize, actual: usize },
    InvalidHexColor { value: String, reason: &'static str },
    UnknownPalette { name: String },
    PaletteConflict,
}

impl Display for GradientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DigestLength { actual } => {
                write!(f, "digest must be exactly 32 bytes, got {actual} bytes")
            }
            Self::DimensionMismatch { left, right } => write!(
                f,
                "cannot blend rasters of different sizes: {}x{} vs {}x{}",
                left.0, left.1, right.0, right.1
            ),
            Self::DimensionsOverflow => write!(f, "raster dimensions overflowed usize"),
            Self::BufferLength { expected, actual } => write!(
                f,
                "RGBA buffer length mismatch: expected {expected} bytes, got {actual} bytes"
            ),
            Self::InvalidHexColor { value, reason } => {
                write!(f, "invalid hex color '{value}': {reason}")
            }
            Self::UnknownPalette { name } => write!(
                f,
                "unknown palette '{name}' (expected one of: default, blue, earth, japanese, ocean)"
            ),
            Self::PaletteConflict => write!(
                f,
                "give either a palette name or explicit colors, not both"
            ),
        }
    }
}

impl Error for GradientError {}
