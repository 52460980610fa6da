//! YAML job files: batches of renders with explicit palettes, sizes, clamp
//! modes and optional forced seeds.
//!
//! ```yaml
//! jobs:
//!   - input: LandscapeShowcase
//!     palette: ocean
//!     width: 1920
//!     height: 1080
//!     mode: single
//!     seeds: { angle: 0.1, warp_freq_x: 0.6, warp_amp_x: 0.5, hill_amp: 0.2 }
//!     output: landscape.png
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Palette;
use crate::digest::{reverse_chars, Digest};
use crate::field::ClampMode;
use crate::params::{ParameterReport, ParameterSet, SeedOverrides, SeedSet};
use crate::pipeline::{blend, synthesize_pair};
use crate::raster::{synthesize_raster, Raster};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

/// `blend` renders the input and its reversed form and averages them;
/// `single` renders the input digest alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Blend,
    Single,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub input: String,
    #[serde(default)]
    pub palette: Option<String>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub clamp: ClampMode,
    #[serde(default)]
    pub mode: RenderMode,
    #[serde(default)]
    pub seeds: SeedOverrides,
    pub output: PathBuf,
    /// Also write `<output>.json` with the derived parameters.
    #[serde(default)]
    pub write_params: bool,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

impl Job {
    pub fn validate(&self) -> Result<Palette> {
        if self.input.is_empty() {
            bail!("job input cannot be empty");
        }
        if self.width == 0 || self.height == 0 {
            bail!(
                "resolution must be positive, got {}x{}",
                self.width,
                self.height
            );
        }
        let bad_seeds = self.seeds.out_of_range();
        if !bad_seeds.is_empty() {
            bail!("forced seeds must lie in [0, 1]: {}", bad_seeds.join(", "));
        }
        Ok(Palette::resolve(
            self.palette.as_deref(),
            self.colors.as_deref(),
        )?)
    }

    fn parameters_for(&self, input: &str) -> ParameterSet {
        let seeds = SeedSet::from_digest(&Digest::of_str(input)).with_overrides(&self.seeds);
        ParameterSet::from_seeds(seeds, self.width, self.height)
    }

    /// Renders the job in memory. The returned parameters belong to the
    /// forward input.
    pub fn render(&self, palette: &Palette) -> Result<(Raster, ParameterSet)> {
        let forward = self.parameters_for(&self.input);
        let raster = match self.mode {
            RenderMode::Single => {
                synthesize_raster(&forward, palette, self.width, self.height, self.clamp)?
            }
            RenderMode::Blend => {
                let reversed = self.parameters_for(&reverse_chars(&self.input));
                let (a, b) = synthesize_pair(
                    &forward,
                    &reversed,
                    palette,
                    self.width,
                    self.height,
                    self.clamp,
                )?;
                blend(&a, &b)?
            }
        };
        Ok((raster, forward))
    }
}

/// What one job produced, as reported by `build --json`.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub input: String,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub mode: RenderMode,
    pub clamp: ClampMode,
    pub pixel_sha256: String,
}

#[derive(Serialize)]
struct ParamsSidecar<'a> {
    input: &'a str,
    mode: RenderMode,
    clamp: ClampMode,
    palette: &'a Palette,
    forced_seeds: &'a SeedOverrides,
    parameters: ParameterReport,
}

pub fn load_job_file(path: &Path) -> Result<JobFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read job file {}", path.display()))?;
    let mut file: JobFile = serde_yaml::from_str(&contents).map_err(|error| {
        let location = error
            .location()
            .map(|location| format!("line {}, column {}", location.line(), location.column()))
            .unwrap_or_else(|| "unknown location".to_owned());
        anyhow!(
            "failed to parse yaml in {} at {}: {}",
            path.display(),
            location,
            error
        )
    })?;

    validate_job_file(&mut file, path)?;
    Ok(file)
}

fn validate_job_file(file: &mut JobFile, path: &Path) -> Result<()> {
    if file.jobs.is_empty() {
        bail!("job file must define at least one job");
    }

    let job_dir = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut seen_outputs = HashSet::with_capacity(file.jobs.len());
    for (index, job) in file.jobs.iter_mut().enumerate() {
        job.validate()
            .with_context(|| format!("failed validating job {index} ('{}')", job.input))?;

        if job.output.is_relative() {
            job.output = job_dir.join(&job.output);
        }
        if !seen_outputs.insert(job.output.clone()) {
            bail!("duplicate job output '{}'", job.output.display());
        }
    }
    Ok(())
}

/// Renders and writes every job in order.
pub fn run_job_file(path: &Path) -> Result<Vec<JobSummary>> {
    let file = load_job_file(path)?;
    let mut summaries = Vec::with_capacity(file.jobs.len());

    for job in &file.jobs {
        let palette = job.validate()?;
        log::info!(
            "rendering '{}' ({}x{}, {:?}) -> {}",
            job.input,
            job.width,
            job.height,
            job.mode,
            job.output.display()
        );
        let (raster, params) = job
            .render(&palette)
            .with_context(|| format!("failed rendering job '{}'", job.input))?;
        raster.save_png(&job.output)?;

        if job.write_params {
            let sidecar = ParamsSidecar {
                input: &job.input,
                mode: job.mode,
                clamp: job.clamp,
                palette: &palette,
                forced_seeds: &job.seeds,
                parameters: params.report(),
            };
            let sidecar_path = job.output.with_extension("json");
            fs::write(&sidecar_path, serde_json::to_string_pretty(&sidecar)?)
                .with_context(|| format!("failed to write {}", sidecar_path.display()))?;
        }

        summaries.push(JobSummary {
            input: job.input.clone(),
            output: job.output.clone(),
            width: job.width,
            height: job.height,
            mode: job.mode,
            clamp: job.clamp,
            pixel_sha256: raster.sha256_hex(),
        });
    }

    Ok(summaries)
}
