use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use serde_json::json;

use hashgrad::digest::{reverse_chars, Digest};
use hashgrad::error_codes::{find_coded_error, CodedError};
use hashgrad::job::{run_job_file, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use hashgrad::sweep::{builtin_cases, run_sweep, SweepOptions};
use hashgrad::{derive_parameters, render_input, ClampMode, Palette};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("HASHGRAD_GIT_HASH"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "hashgrad")]
#[command(about = "Deterministic hash-seeded gradient images")]
#[command(version = VERSION)]
struct Cli {
    /// Print machine-readable JSON on stdout (results and errors).
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct SizeArgs {
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    width: u32,
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    height: u32,
}

impl SizeArgs {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CodedError::usage(
                "INVALID_DIMENSIONS",
                format!(
                    "width and height must be > 0, got {}x{}",
                    self.width, self.height
                ),
            )
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render the blended gradient for an input string.
    Render {
        input: String,
        #[arg(short = 'o', long = "output", default_value = "output.png")]
        output: PathBuf,
        /// Named palette: default, blue, earth, japanese, ocean.
        #[arg(long, conflicts_with = "colors")]
        palette: Option<String>,
        /// Three hex colors, comma separated (e.g. "#FF0000,#FFFFFF,#4A4D4E").
        #[arg(long, value_delimiter = ',')]
        colors: Option<Vec<String>>,
        #[command(flatten)]
        size: SizeArgs,
        #[arg(long)]
        smoothstep: bool,
    },
    /// Print the derived parameters for an input and its reversed form.
    Params {
        input: String,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Render the built-in parameter sweep and ablation cases.
    Sweep {
        #[arg(long, default_value = "test")]
        input: String,
        #[arg(long = "out-dir", default_value = "sweeps")]
        out_dir: PathBuf,
        /// Only render these categories (repeatable).
        #[arg(long = "category")]
        categories: Vec<String>,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Render every job in a YAML job file.
    Build { job_file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Render {
            input,
            output,
            palette,
            colors,
            size,
            smoothstep,
        } => run_render(
            &input,
            &output,
            palette.as_deref(),
            colors.as_deref(),
            &size,
            ClampMode::from_smoothstep(smoothstep),
            json_output,
        ),
        Commands::Params { input, size } => run_params(&input, &size, json_output),
        Commands::Sweep {
            input,
            out_dir,
            categories,
            size,
        } => run_sweep_command(input, out_dir, &categories, &size, json_output),
        Commands::Build { job_file } => run_build(&job_file, json_output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, json_output);
            ExitCode::FAILURE
        }
    }
}

fn report_error(err: &anyhow::Error, json_output: bool) {
    if json_output {
        let coded = find_coded_error(err)
            .unwrap_or_else(|| CodedError::runtime("RUNTIME_ERROR", format!("{err:#}")));
        match serde_json::to_string(&coded.envelope()) {
            Ok(body) => println!("{body}"),
            Err(_) => eprintln!("error: {err:#}"),
        }
    } else {
        error!("{err:#}");
    }
}

fn run_render(
    input: &str,
    output: &Path,
    palette: Option<&str>,
    colors: Option<&[String]>,
    size: &SizeArgs,
    clamp: ClampMode,
    json_output: bool,
) -> Result<()> {
    size.validate()?;
    let palette = Palette::resolve(palette, colors).context("invalid palette")?;

    let raster = render_input(input, &palette, size.width, size.height, clamp)?;
    info!("saving {}", output.display());
    raster.save_png(output)?;

    if json_output {
        println!(
            "{}",
            json!({
                "ok": true,
                "output": output,
                "width": size.width,
                "height": size.height,
                "clamp": clamp,
                "palette": palette,
                "pixel_sha256": raster.sha256_hex(),
            })
        );
    } else {
        println!("Wrote {}", output.display());
    }
    Ok(())
}

fn run_params(input: &str, size: &SizeArgs, json_output: bool) -> Result<()> {
    size.validate()?;
    let reversed = reverse_chars(input);
    let forward_digest = Digest::of_str(input);
    let reversed_digest = Digest::of_str(&reversed);

    let body = json!({
        "width": size.width,
        "height": size.height,
        "forward": {
            "input": input,
            "sha256": forward_digest.to_hex(),
            "parameters": derive_parameters(&forward_digest, size.width, size.height).report(),
        },
        "reversed": {
            "input": reversed,
            "sha256": reversed_digest.to_hex(),
            "parameters": derive_parameters(&reversed_digest, size.width, size.height).report(),
        },
    });

    if json_output {
        println!("{}", serde_json::to_string(&body)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(())
}

fn run_sweep_command(
    input: String,
    out_dir: PathBuf,
    categories: &[String],
    size: &SizeArgs,
    json_output: bool,
) -> Result<()> {
    size.validate()?;
    let mut cases = builtin_cases();
    if !categories.is_empty() {
        let known: Vec<&str> = cases.iter().map(|c| c.category).collect();
        if let Some(unknown) = categories.iter().find(|c| !known.contains(&c.as_str())) {
            let mut allowed = known.clone();
            allowed.dedup();
            return Err(CodedError::usage(
                "UNKNOWN_SWEEP_CATEGORY",
                format!("unknown sweep category '{unknown}'"),
            )
            .with_details(json!({ "provided": unknown, "allowed": allowed }))
            .into());
        }
        cases.retain(|c| categories.iter().any(|wanted| wanted == c.category));
    }

    info!("running {} sweep cases into {}", cases.len(), out_dir.display());
    let options = SweepOptions {
        input,
        out_dir,
        width: size.width,
        height: size.height,
    };
    let records = run_sweep(&options, &cases)?;

    if json_output {
        let images: Vec<&PathBuf> = records.iter().map(|record| &record.image).collect();
        println!(
            "{}",
            json!({ "ok": true, "cases": records.len(), "images": images })
        );
    } else {
        println!(
            "Rendered {} sweep cases into {}",
            records.len(),
            options.out_dir.display()
        );
    }
    Ok(())
}

fn run_build(job_file: &Path, json_output: bool) -> Result<()> {
    let summaries = run_job_file(job_file)?;
    if json_output {
        println!("{}", json!({ "ok": true, "jobs": summaries }));
    } else {
        for summary in &summaries {
            println!("Wrote {}", summary.output.display());
        }
    }
    Ok(())
}
