use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;
use spectral_cut::spectrum::io::load_spectrum;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_spectral_cli"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("spectral_cli_{}_{}", name, std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn path_arg(path: &PathBuf) -> String {
    path.to_string_lossy().into_owned()
}

/// Ripple floor (amplitude 0.5) with lines at 30 and 70, 1000 points at 0.1
fn synth_rippled(dir: &PathBuf) -> PathBuf {
    let output = dir.join("rippled.txt");
    let result = cli()
        .args([
            "synth",
            "--output",
            &path_arg(&output),
            "--points",
            "1000",
            "--resolution",
            "0.1",
            "--ripple",
            "0.5",
            "--ripple-period",
            "1.3",
            "--line",
            "30:10:0.4",
            "--line",
            "70:8:0.4",
        ])
        .output()
        .expect("failed to run spectral_cli synth");
    assert!(result.status.success(), "synth exited with {:?}", result.status.code());

    let json = stdout_json(&result.stdout);
    assert_eq!(json["points"], 1000);
    output
}

fn stdout_json(stdout: &[u8]) -> Value {
    let text = String::from_utf8(stdout.to_vec()).expect("stdout UTF-8");
    serde_json::from_str(text.trim()).expect("JSON report on stdout")
}

#[test]
fn noise_reports_floor_level() {
    let dir = scratch_dir("noise");
    let input = synth_rippled(&dir);

    let output = cli()
        .args(["noise", "--input", &path_arg(&input), "--seed", "1.0", "--resolution", "0.01"])
        .output()
        .expect("failed to run spectral_cli noise");
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    let level = json["level"].as_f64().expect("level field");
    assert!((level - 0.5).abs() / 0.5 < 0.02, "level {level}");
    assert_eq!(json["seed_threshold"].as_f64(), Some(1.0));
}

#[test]
fn adaptive_cut_writes_zeroed_spectrum() {
    let dir = scratch_dir("adaptive");
    let input = synth_rippled(&dir);
    let cut_path = dir.join("cut.txt");

    let output = cli()
        .args([
            "cut",
            "--input",
            &path_arg(&input),
            "--output",
            &path_arg(&cut_path),
            "--at",
            "30.05",
            "--adaptive",
            "--seed",
            "1.0",
            "--resolution",
            "0.01",
        ])
        .output()
        .expect("failed to run spectral_cli cut");
    assert!(output.status.success(), "cut exited with {:?}", output.status.code());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["mode"]["mode"], "noise_adaptive");
    assert!(json["noise"]["level"].as_f64().is_some());
    let window = &json["windows"][0];
    assert!(window["start"].as_u64().unwrap() <= 290);
    assert!(window["end"].as_u64().unwrap() > 310);

    let cut = load_spectrum(&cut_path).expect("cut spectrum on disk");
    assert!(cut.intensities()[290..=310].iter().all(|&v| v == 0.0));
    assert!(cut.intensities()[700] > 7.0);
}

#[test]
fn fixed_cut_reports_zeroed_count() {
    let dir = scratch_dir("fixed");
    let input = synth_rippled(&dir);

    let output = cli()
        .args(["cut", "--input", &path_arg(&input), "--at", "50", "--width", "1.05"])
        .output()
        .expect("failed to run spectral_cli cut");
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["mode"]["mode"], "fixed");
    assert_eq!(json["zeroed_samples"], 9);
    assert!(json.get("noise").is_none());
}

#[test]
fn peaks_lists_lines_above_threshold() {
    let dir = scratch_dir("peaks");
    let input = synth_rippled(&dir);

    let output = cli()
        .args(["peaks", "--input", &path_arg(&input), "--min", "5"])
        .output()
        .expect("failed to run spectral_cli peaks");
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["count"], 2);
    let first = json["peaks"][0]["frequency"].as_f64().unwrap();
    assert!((first - 30.0).abs() < 0.05);
}

#[test]
fn sweep_table_prints_guess_rows() {
    let dir = scratch_dir("sweep");
    let input = synth_rippled(&dir);

    let output = cli()
        .args([
            "sweep",
            "--input",
            &path_arg(&input),
            "--start",
            "1.0",
            "--end",
            "2.0",
            "--steps",
            "3",
            "--resolution",
            "0.01",
            "--format",
            "table",
        ])
        .output()
        .expect("failed to run spectral_cli sweep");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let rows: Vec<&str> = stdout.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.starts_with("GUESS:")));
    assert!(rows[0].starts_with("GUESS: 1.000   ACTUAL: 0.50"), "got {}", rows[0]);
}

#[test]
fn missing_input_fails_with_exit_code_one() {
    let output = cli()
        .args(["noise", "--input", "/nonexistent/spectrum.txt"])
        .output()
        .expect("failed to run spectral_cli noise");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("Error"), "expected error on stderr, got {stderr}");
}

#[test]
fn cut_without_targets_is_rejected() {
    let dir = scratch_dir("no_targets");
    let input = synth_rippled(&dir);

    let output = cli()
        .args(["cut", "--input", &path_arg(&input), "--width", "1.0"])
        .output()
        .expect("failed to run spectral_cli cut");
    assert_eq!(output.status.code(), Some(1));
}
