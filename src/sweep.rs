//! Parameter sweeps and ablations over forced seeds.
//!
//! Every case starts from the digest of a base input and forces some seeds,
//! so unforced values (phases, mostly) still vary with the input. The
//! `input_string` cases instead swap the input and force nothing. Cases
//! render a single raster each; there is no pair or blend step here.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::color::Palette;
use crate::digest::Digest;
use crate::field::ClampMode;
use crate::params::{ParameterReport, ParameterSet, SeedOverrides, SeedSet};
use crate::raster::synthesize_raster;

const BASE_ANGLE: f64 = 0.25;
const BASE_WARP_FREQ: f64 = 0.5;
const BASE_WARP_AMP: f64 = 0.5;
const BASE_HILL_FREQ: f64 = 0.5;
const BASE_HILL_AMP: f64 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct SweepCase {
    pub category: &'static str,
    pub description: String,
    /// Replaces the sweep's base input for this case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    pub seeds: SeedOverrides,
    pub palette: Palette,
    pub clamp: ClampMode,
}

/// The knobs a sweep case varies. Warp values apply to both axes.
#[derive(Debug, Clone, Copy)]
struct Knobs {
    angle: f64,
    warp_freq: f64,
    warp_amp: f64,
    hill_freq: f64,
    hill_amp: f64,
    color_order: u8,
}

const BASE: Knobs = Knobs {
    angle: BASE_ANGLE,
    warp_freq: BASE_WARP_FREQ,
    warp_amp: BASE_WARP_AMP,
    hill_freq: BASE_HILL_FREQ,
    hill_amp: BASE_HILL_AMP,
    color_order: 0,
};

impl Knobs {
    fn overrides(self) -> SeedOverrides {
        SeedOverrides {
            angle: Some(self.angle),
            warp_freq_x: Some(self.warp_freq),
            warp_amp_x: Some(self.warp_amp),
            warp_freq_y: Some(self.warp_freq),
            warp_amp_y: Some(self.warp_amp),
            hill_freq: Some(self.hill_freq),
            hill_amp: Some(self.hill_amp),
            color_order: Some(self.color_order),
            ..SeedOverrides::default()
        }
    }
}

fn case(category: &'static str, description: impl Into<String>, knobs: Knobs) -> SweepCase {
    SweepCase {
        category,
        description: description.into(),
        input: None,
        seeds: knobs.overrides(),
        palette: Palette::DEFAULT,
        clamp: ClampMode::Hard,
    }
}

/// The built-in case table, grouped by category.
pub fn builtin_cases() -> Vec<SweepCase> {
    let mut cases = Vec::new();

    for (angle, degrees) in [(0.0, 0), (0.25, 90), (0.5, 180), (0.75, 270)] {
        cases.push(case(
            "angle",
            format!("Angle: {degrees} deg"),
            Knobs { angle, ..BASE },
        ));
    }

    for (label, warp_freq) in [("Low", 0.1), ("Medium", 0.5), ("High", 0.9)] {
        cases.push(case(
            "warp",
            format!("Warp Freq: {label} ({warp_freq})"),
            Knobs { warp_freq, ..BASE },
        ));
    }
    for (label, warp_amp) in [("Low", 0.1), ("High", 0.9)] {
        cases.push(case(
            "warp",
            format!("Warp Amp: {label} ({warp_amp})"),
            Knobs { warp_amp, ..BASE },
        ));
    }

    for (label, value) in [("Low", 0.1), ("Medium", 0.5), ("High", 0.9)] {
        cases.push(case(
            "hill",
            format!("Hill Freq/Amp: {label} ({value})"),
            Knobs {
                hill_freq: value,
                hill_amp: value,
                ..BASE
            },
        ));
    }

    for (description, input) in [
        ("Input: 'test' (Baseline)", "test"),
        ("Input: 'hi'", "hi"),
        (
            "Input: Long w/ Symbols",
            "a_very_long_test_string_with_symbols_!@#$%^&*()",
        ),
        ("Input: 'testing1'", "testing1"),
        ("Input: 'testing2'", "testing2"),
    ] {
        cases.push(SweepCase {
            category: "input_string",
            description: description.to_owned(),
            input: Some(input.to_owned()),
            seeds: SeedOverrides::default(),
            palette: Palette::DEFAULT,
            clamp: ClampMode::Hard,
        });
    }

    for color_order in 0..6 {
        cases.push(case(
            "color_order",
            format!("Color Order {color_order}"),
            Knobs {
                color_order,
                ..BASE
            },
        ));
    }

    let edges = [
        (
            "Edge: Near zero warp freq/amp",
            Knobs {
                warp_freq: 0.01,
                warp_amp: 0.05,
                ..BASE
            },
        ),
        (
            "Edge: Near max warp freq/amp",
            Knobs {
                warp_freq: 0.99,
                warp_amp: 0.95,
                ..BASE
            },
        ),
        (
            "Edge: Near zero hill freq/amp",
            Knobs {
                hill_freq: 0.01,
                hill_amp: 0.01,
                ..BASE
            },
        ),
        (
            "Edge: Near max hill freq/amp",
            Knobs {
                hill_freq: 0.99,
                hill_amp: 0.99,
                ..BASE
            },
        ),
        ("Edge: Zero angle", Knobs { angle: 0.0, ..BASE }),
        (
            "Edge: High warp & hill interaction",
            Knobs {
                warp_freq: 0.9,
                warp_amp: 0.8,
                hill_freq: 0.9,
                hill_amp: 0.9,
                ..BASE
            },
        ),
    ];
    for (description, knobs) in edges {
        cases.push(case("edge_cases", description, knobs));
    }

    let ablations = [
        (
            "Ablation: Linear Gradient",
            Knobs {
                warp_amp: 0.0,
                hill_amp: 0.0,
                ..BASE
            },
        ),
        ("Ablation: Warp Only", Knobs { hill_amp: 0.0, ..BASE }),
        ("Ablation: Hill Only", Knobs { warp_amp: 0.0, ..BASE }),
        ("Ablation: Standard (Warp+Hill)", BASE),
    ];
    for (description, knobs) in ablations {
        cases.push(case("ablation", description, knobs));
    }

    for (name, palette, color_order) in [
        ("Default", Palette::DEFAULT, 0),
        ("Blue", Palette::BLUE, 0),
        ("Earth", Palette::EARTH, 0),
        ("Blue, Order 3", Palette::BLUE, 3),
    ] {
        cases.push(SweepCase {
            palette,
            ..case(
                "palette",
                format!("Palette: {name}"),
                Knobs {
                    color_order,
                    ..BASE
                },
            )
        });
    }

    // Rows are warp frequency, columns warp amplitude.
    for warp_freq in [0.1, 0.5, 0.9] {
        for warp_amp in [0.1, 0.5, 0.9] {
            cases.push(case(
                "warp_sweep_2d",
                format!("Warp Freq={warp_freq}, Amp={warp_amp}"),
                Knobs {
                    warp_freq,
                    warp_amp,
                    ..BASE
                },
            ));
        }
    }

    // Large hill amplitude overshoots [0, 1] often enough to show banding.
    let overshoot = Knobs {
        angle: 0.7,
        warp_freq: 0.8,
        warp_amp: 0.6,
        hill_freq: 0.9,
        hill_amp: 0.95,
        color_order: 0,
    };
    for clamp in [ClampMode::Hard, ClampMode::Smoothstep] {
        cases.push(SweepCase {
            palette: Palette::EARTH,
            clamp,
            ..case("clamping", format!("Clamping: {clamp:?}"), overshoot)
        });
    }

    cases
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepRecord {
    pub category: &'static str,
    pub index: usize,
    pub description: String,
    pub input: String,
    pub image: PathBuf,
    pub forced_seeds: SeedOverrides,
    pub palette: Palette,
    pub clamp: ClampMode,
    pub parameters: ParameterReport,
    /// Wall time spent in raster synthesis, excluding PNG encoding.
    pub duration_ms: f64,
}

#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub input: String,
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Renders every case under `<out_dir>/<category>/case_<n>.png` with a JSON
/// sidecar. Categories run on their own scoped threads.
pub fn run_sweep(options: &SweepOptions, cases: &[SweepCase]) -> Result<Vec<SweepRecord>> {
    let mut categories: Vec<&'static str> = Vec::new();
    for case in cases {
        if !categories.contains(&case.category) {
            categories.push(case.category);
        }
    }

    let per_category = thread::scope(|s| {
        let handles = categories
            .iter()
            .map(|&category| {
                let members: Vec<&SweepCase> =
                    cases.iter().filter(|c| c.category == category).collect();
                s.spawn(move || render_category(options, category, &members))
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .map_err(|_| anyhow!("sweep worker thread panicked"))?
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let records: Vec<SweepRecord> = per_category.into_iter().flatten().collect();
    log::info!(
        "sweep finished: {} cases in {} categories under {}",
        records.len(),
        categories.len(),
        options.out_dir.display()
    );
    Ok(records)
}

fn render_category(
    options: &SweepOptions,
    category: &'static str,
    cases: &[&SweepCase],
) -> Result<Vec<SweepRecord>> {
    let dir = options.out_dir.join(category);
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create sweep dir {}", dir.display()))?;

    let mut records = Vec::with_capacity(cases.len());
    for (index, case) in cases.iter().enumerate() {
        let input = case.input.as_deref().unwrap_or(&options.input);
        let seeds = SeedSet::from_digest(&Digest::of_str(input)).with_overrides(&case.seeds);
        let params = ParameterSet::from_seeds(seeds, options.width, options.height);

        let started = Instant::now();
        let raster = synthesize_raster(
            &params,
            &case.palette,
            options.width,
            options.height,
            case.clamp,
        )?;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        let image = dir.join(format!("case_{index}.png"));
        raster.save_png(&image)?;

        let record = SweepRecord {
            category,
            index,
            description: case.description.clone(),
            input: input.to_owned(),
            image: image.clone(),
            forced_seeds: case.seeds,
            palette: case.palette,
            clamp: case.clamp,
            parameters: params.report(),
            duration_ms,
        };
        write_sidecar(&image.with_extension("json"), &record)?;
        log::debug!("{}/{}: {}", category, index, case.description);
        records.push(record);
    }
    Ok(records)
}

fn write_sidecar(path: &Path, record: &SweepRecord) -> Result<()> {
    let body = serde_json::to_string_pretty(record)?;
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))
}
