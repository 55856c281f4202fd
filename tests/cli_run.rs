use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_astro_snr"))
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("astro_snr_cli_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

fn synth(dir: &Path, samples: usize) -> PathBuf {
    let output = cli()
        .args(["synth", "--output-dir"])
        .arg(dir)
        .args(["--samples", &samples.to_string(), "--size", "48", "--seed", "7"])
        .output()
        .expect("failed to run astro_snr synth");
    assert!(output.status.success(), "synth exited with {:?}", output.status.code());
    dir.join("samples.dat")
}

fn run(list: &Path, out: &Path, extra: &[&str]) -> Output {
    cli()
        .arg("run")
        .arg("--sample-list")
        .arg(list)
        .arg("--output-dir")
        .arg(out)
        .args(extra)
        .output()
        .expect("failed to run astro_snr run")
}

fn read_json(path: &Path) -> Value {
    let contents = fs::read_to_string(path).expect("report file");
    serde_json::from_str(&contents).expect("report JSON")
}

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path).expect("report file").lines().count()
}

#[test]
fn synth_then_run_writes_reports() {
    let dir = scratch_dir("roundtrip");
    let list = synth(&dir.join("data"), 8);
    let out = dir.join("out");

    let output = run(&list, &out, &[]);
    assert!(output.status.success(), "run exited with {:?}", output.status.code());

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(stdout.contains("Using 3sigma_clip for Background Noise Estimation."));
    assert!(stdout.contains("Images with an SNR 10+:"), "got {stdout}");

    let summary = read_json(&out.join("summary.json"));
    assert_eq!(summary["processed"], 8);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["estimator"], "sigma_clip");
    let coarse_total: u64 = summary["coarse"]
        .as_array()
        .expect("coarse counts")
        .iter()
        .map(|bin| bin["count"].as_u64().unwrap_or_default())
        .sum();
    assert_eq!(coarse_total, 8);

    let fine_total: usize = ["0-2", "2-5", "5-10", "10-20", "20-50", "50-100", "100-200", "200+"]
        .iter()
        .map(|label| line_count(&out.join(format!("snr_{label}.txt"))))
        .sum();
    assert_eq!(fine_total, 8);

    // injected strengths 15, 30, 75, 150 and 300 sigma
    assert_eq!(line_count(&out.join("snr_more_10.txt")), 5);
    assert!(fs::read_to_string(out.join("snr_200+.txt"))
        .expect("fine bin file")
        .contains("sample7.json"));
    assert_eq!(line_count(&out.join("json_snr_list.txt")), 8);

    let images = read_json(&out.join("images_to_snr.json"));
    assert_eq!(images.as_object().map(|m| m.len()), Some(8));
}

#[test]
fn mad_estimator_is_selectable() {
    let dir = scratch_dir("mad");
    let list = synth(&dir.join("data"), 4);
    let out = dir.join("out");

    let output = run(&list, &out, &["--mad", "--workers", "2"]);
    assert!(output.status.success());
    assert_eq!(read_json(&out.join("summary.json"))["estimator"], "mad");
}

#[test]
fn estimator_flags_are_exclusive() {
    let dir = scratch_dir("exclusive");
    let list = synth(&dir.join("data"), 1);

    let output = run(&list, &dir.join("out"), &["--mad", "--3sigma-clip"]);
    assert!(!output.status.success());
}

#[test]
fn unknown_estimator_in_config_is_fatal() {
    let dir = scratch_dir("config");
    let list = synth(&dir.join("data"), 1);
    let config = dir.join("config.json");
    fs::write(&config, r#"{ "noise": { "estimator": "biweight" } }"#).expect("write config");

    let output = run(&list, &dir.join("out"), &["--config", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("biweight"), "expected estimator name in stderr, got {stderr}");
    assert!(!dir.join("out").join("summary.json").exists());
}

#[test]
fn cli_flag_overrides_config_file() {
    let dir = scratch_dir("override");
    let list = synth(&dir.join("data"), 2);
    let config = dir.join("config.json");
    fs::write(&config, r#"{ "noise": { "estimator": "biweight" } }"#).expect("write config");
    let out = dir.join("out");

    let output = run(&list, &out, &["--config", config.to_str().unwrap(), "--mad"]);
    assert!(output.status.success());
    assert_eq!(read_json(&out.join("summary.json"))["estimator"], "mad");
}

#[test]
fn missing_image_is_skipped_not_fatal() {
    let dir = scratch_dir("missing");
    let list = synth(&dir.join("data"), 3);

    let orphan_dir = dir.join("data").join("orphan").join("labels");
    fs::create_dir_all(&orphan_dir).expect("create orphan dir");
    let orphan = orphan_dir.join("orphan.json");
    fs::write(&orphan, r#"{ "img": "../imgs/orphan.json", "objs": [] }"#).expect("write label");

    let mut contents = fs::read_to_string(&list).expect("sample list");
    contents.push_str(&format!("{}\n", orphan.display()));
    fs::write(&list, contents).expect("rewrite sample list");

    let out = dir.join("out");
    let output = run(&list, &out, &[]);
    assert!(output.status.success());

    let summary = read_json(&out.join("summary.json"));
    assert_eq!(summary["processed"], 3);
    assert_eq!(summary["failed"], 1);
    assert_eq!(summary["failures"][0]["code"], 1001);
}

#[test]
fn missing_sample_list_is_fatal() {
    let dir = scratch_dir("nolist");
    let output = run(&dir.join("absent.dat"), &dir.join("out"), &[]);
    assert_eq!(output.status.code(), Some(1));
}
