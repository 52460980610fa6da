pub mod color;
pub mod digest;
pub mod error;
pub mod error_codes;
pub mod field;
pub mod job;
pub mod params;
pub mod pipeline;
pub mod raster;
pub mod sweep;

pub use color::{ColorOrder, ColorStops, Palette, Rgb};
pub use digest::Digest;
pub use error::GradientError;
pub use field::{ClampMode, FieldSynthesizer, ProjectionRange};
pub use params::{derive_parameters, ParameterReport, ParameterSet, SeedOverrides, SeedSet};
pub use pipeline::{blend, generate_pair, render_input};
pub use raster::{synthesize_raster, Raster};
