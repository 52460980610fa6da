use std::fs;
use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::tempdir;

fn run_hashgrad(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hashgrad"))
        .current_dir(cwd)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("hashgrad command should run")
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be json")
}

#[test]
fn render_json_reports_output_and_pixel_hash() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_hashgrad(
        dir.path(),
        &[
            "render", "test", "-o", "out/test.png", "--width", "96", "--height", "54", "--json",
        ],
    );
    assert!(output.status.success(), "render --json should succeed");

    let parsed = stdout_json(&output);
    assert_eq!(parsed["ok"], Value::Bool(true));
    assert_eq!(parsed["width"], 96);
    assert_eq!(parsed["height"], 54);
    assert_eq!(parsed["clamp"], "hard");
    assert_eq!(parsed["palette"]["colors"][0], "#D91009");
    assert_eq!(
        parsed["pixel_sha256"],
        "ae0b40423d14c253acb1eb1c2954c43ffddd696c9ab864c3f85675986381d191"
    );

    let dimensions =
        image::image_dimensions(dir.path().join("out/test.png")).expect("png should decode");
    assert_eq!(dimensions, (96, 54));
}

#[test]
fn render_is_byte_stable_across_runs() {
    let dir = tempdir().expect("tempdir should create");
    let args = [
        "render",
        "Hello",
        "--colors",
        "#FF0000,#FFFFFF,#4A4D4E",
        "--smoothstep",
        "--width",
        "40",
        "--height",
        "30",
    ];

    let first = run_hashgrad(dir.path(), &[&args[..], &["-o", "a.png"][..]].concat());
    let second = run_hashgrad(dir.path(), &[&args[..], &["-o", "b.png"][..]].concat());
    assert!(first.status.success() && second.status.success());
    assert_eq!(
        fs::read(dir.path().join("a.png")).expect("a.png"),
        fs::read(dir.path().join("b.png")).expect("b.png"),
    );
}

#[test]
fn params_json_lists_forward_and_reversed_digests() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_hashgrad(dir.path(), &["params", "test", "--json"]);
    assert!(output.status.success(), "params --json should succeed");

    let parsed = stdout_json(&output);
    assert_eq!(parsed["width"], 800);
    assert_eq!(parsed["height"], 600);
    assert_eq!(
        parsed["forward"]["sha256"],
        "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
    );
    assert_eq!(parsed["reversed"]["input"], "tset");
    assert_eq!(
        parsed["reversed"]["sha256"],
        "18ea285983df355f3024e412fb46ad6cbd98a7ffe6872e26612e35f38aa39c41"
    );
    assert_eq!(parsed["forward"]["parameters"]["color_order"], 4);
    assert_eq!(parsed["forward"]["parameters"]["diagonal"], 1000.0);
}

#[test]
fn invalid_palette_and_colors_emit_typed_error_envelopes() {
    let dir = tempdir().expect("tempdir should create");

    let unknown = run_hashgrad(
        dir.path(),
        &["render", "x", "--palette", "neon", "--json"],
    );
    assert_eq!(unknown.status.code(), Some(1));
    let parsed = stdout_json(&unknown);
    assert_eq!(parsed["ok"], Value::Bool(false));
    assert_eq!(parsed["error"]["code"], "UNKNOWN_PALETTE");
    assert_eq!(parsed["error"]["kind"], "usage");

    let bad_hex = run_hashgrad(
        dir.path(),
        &["render", "x", "--colors", "#FF0000,#GGGGGG,#000", "--json"],
    );
    assert_eq!(bad_hex.status.code(), Some(1));
    let parsed = stdout_json(&bad_hex);
    assert_eq!(parsed["error"]["code"], "INVALID_HEX_COLOR");
    assert_eq!(parsed["error"]["details"]["provided"], "#GGGGGG");

    let zero = run_hashgrad(dir.path(), &["render", "x", "--width", "0", "--json"]);
    assert_eq!(stdout_json(&zero)["error"]["code"], "INVALID_DIMENSIONS");

    assert!(!dir.path().join("output.png").exists());
}

#[test]
fn palette_and_colors_are_mutually_exclusive() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_hashgrad(
        dir.path(),
        &["render", "x", "--palette", "earth", "--colors", "#000,#888,#FFF"],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot be used with"));
}

#[test]
fn build_renders_every_job_in_a_job_file() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(
        dir.path().join("jobs.yaml"),
        r##"
jobs:
  - input: alpha
    palette: blue
    width: 32
    height: 18
    output: renders/alpha.png
  - input: beta
    colors: ["#000000", "#808080", "#FFFFFF"]
    width: 16
    height: 16
    clamp: smoothstep
    mode: single
    output: renders/beta.png
    write_params: true
"##,
    )
    .expect("job file should write");

    let output = run_hashgrad(dir.path(), &["build", "jobs.yaml", "--json"]);
    assert!(output.status.success(), "build should succeed");

    let parsed = stdout_json(&output);
    let jobs = parsed["jobs"].as_array().expect("jobs should be array");
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1]["mode"], "single");
    assert_eq!(jobs[1]["clamp"], "smoothstep");
    assert!(dir.path().join("renders/alpha.png").is_file());
    assert!(dir.path().join("renders/beta.png").is_file());
    assert!(dir.path().join("renders/beta.json").is_file());
    assert!(!dir.path().join("renders/alpha.json").exists());
}

#[test]
fn build_rejects_unknown_job_fields() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(
        dir.path().join("jobs.yaml"),
        "jobs:\n  - input: x\n    output: x.png\n    dither: true\n",
    )
    .expect("job file should write");

    let output = run_hashgrad(dir.path(), &["build", "jobs.yaml", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let parsed = stdout_json(&output);
    assert_eq!(parsed["error"]["code"], "RUNTIME_ERROR");
    assert!(parsed["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("dither"));
}

#[test]
fn sweep_filters_categories_and_writes_sidecars() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_hashgrad(
        dir.path(),
        &[
            "sweep",
            "--category",
            "ablation",
            "--out-dir",
            "sw",
            "--width",
            "20",
            "--height",
            "12",
            "--json",
        ],
    );
    assert!(output.status.success(), "sweep should succeed");
    assert_eq!(stdout_json(&output)["cases"], 4);

    for index in 0..4 {
        let png = dir.path().join(format!("sw/ablation/case_{index}.png"));
        assert!(png.is_file(), "{} missing", png.display());
        let sidecar: Value = serde_json::from_str(
            &fs::read_to_string(png.with_extension("json")).expect("sidecar should read"),
        )
        .expect("sidecar should parse");
        assert_eq!(sidecar["category"], "ablation");
        assert_eq!(sidecar["index"], index);
    }
    assert!(!dir.path().join("sw/angle").exists());

    let unknown = run_hashgrad(dir.path(), &["sweep", "--category", "gamma", "--json"]);
    assert_eq!(unknown.status.code(), Some(1));
    assert_eq!(
        stdout_json(&unknown)["error"]["code"],
        "UNKNOWN_SWEEP_CATEGORY"
    );
}
