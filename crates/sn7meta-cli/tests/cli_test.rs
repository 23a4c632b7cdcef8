//! Integration tests for the sn7meta binary
//!
//! These run the built binary with a clean SN7_* environment and check exit
//! codes and `--json` output.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const REFERENCE: &str = "global_monthly_2018_01_mosaic_L15-0331E-1257N_1327_3160_13";

fn sn7meta(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_sn7meta"));
    command.current_dir(dir).args(args).env("RUST_LOG", "off").env_remove("DATABASE_URL");
    for (key, _) in std::env::vars() {
        if key.starts_with("SN7_") {
            command.env_remove(key);
        }
    }
    command.output().expect("Failed to execute sn7meta")
}

fn json_stdout(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

fn write_pixel_csv(dir: &Path, filenames: &[&str]) -> String {
    let path = dir.join("pixels.csv");
    let mut content = String::from("filename,id,geometry\n");
    for (i, filename) in filenames.iter().enumerate() {
        content.push_str(&format!("{},{},\"POLYGON ((0 0, 1 0, 1 1, 0 0))\"\n", filename, i));
    }
    fs::write(&path, content).unwrap();
    path.display().to_string()
}

#[test]
fn test_parse_json() {
    let dir = TempDir::new().unwrap();
    let output = sn7meta(dir.path(), &["parse", REFERENCE, "--json"]);

    assert!(output.status.success());
    let parsed = json_stdout(&output);
    assert_eq!(parsed["status"], "success");
    let chip = &parsed["data"][0]["parsed"];
    assert_eq!(chip["year"], 2018);
    assert_eq!(chip["month"], 1);
    assert_eq!(chip["tile_x"], 331);
    assert_eq!(chip["tile_y"], 1257);
    assert_eq!(chip["utm_zone"], 13);
    assert_eq!(chip["aoi_id"], "global_monthly_2018_01");
}

#[test]
fn test_parse_failure_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let output = sn7meta(dir.path(), &["parse", REFERENCE, "not_a_chip", "--json"]);

    assert!(!output.status.success());
    let parsed = json_stdout(&output);
    assert_eq!(parsed["status"], "error");
    assert!(parsed["data"][1]["error"].as_str().unwrap().contains("not_a_chip"));
}

#[test]
fn test_tile_json() {
    let dir = TempDir::new().unwrap();
    let output = sn7meta(dir.path(), &["tile", "331", "1257", "15", "--json"]);

    assert!(output.status.success());
    let tile = &json_stdout(&output)["data"];
    assert_eq!(tile["epsg"], 32613);
    assert!(tile["west"].as_f64().unwrap() < tile["east"].as_f64().unwrap());
    assert!(tile["polygon"].as_str().unwrap().starts_with("POLYGON"));
}

#[test]
fn test_tile_rejects_bad_zone() {
    let dir = TempDir::new().unwrap();
    let output = sn7meta(dir.path(), &["tile", "331", "1257", "15", "--utm-zone", "61"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_reports_sources() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sn7meta.toml"), "utm_zone = 14\noverlap_policy = \"all\"\n").unwrap();

    let output = sn7meta(dir.path(), &["config", "--overlap", "reject", "--json"]);
    assert!(output.status.success());

    let entries = json_stdout(&output)["data"].as_array().unwrap().clone();
    let entry = |key: &str| entries.iter().find(|e| e["key"] == key).unwrap().clone();

    assert_eq!(entry("utm_zone")["value"], "14");
    assert_eq!(entry("utm_zone")["source"], "File");
    assert_eq!(entry("overlap_policy")["value"], "Reject");
    assert_eq!(entry("overlap_policy")["source"], "Cli");
    assert_eq!(entry("aoi_strategy")["source"], "Default");
}

#[test]
fn test_ingest_memory_json() {
    let dir = TempDir::new().unwrap();
    let csv = write_pixel_csv(
        dir.path(),
        &[REFERENCE, REFERENCE, "global_monthly_2018_02_mosaic_L15-0331E-1257N_1327_3160_13", "broken"],
    );

    let output = sn7meta(dir.path(), &["ingest", "--pixel-csv", &csv, "--json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let data = &json_stdout(&output)["data"];
    assert_eq!(data["report"]["input_rows"], 4);
    assert_eq!(data["report"]["accepted_rows"], 3);
    assert_eq!(data["report"]["aoi_source"], "synthesized");
    assert_eq!(data["report"]["rejected"][0]["kind"], "malformed_filename");
    assert_eq!(data["backend"], "memory");
    assert_eq!(data["load"]["facts"]["inserted"], 3);
    assert_eq!(data["load"]["dim_chip"]["inserted"], 1);
    assert_eq!(data["load"]["dim_time"]["inserted"], 2);
}

#[test]
fn test_ingest_dry_run_skips_load() {
    let dir = TempDir::new().unwrap();
    let csv = write_pixel_csv(dir.path(), &[REFERENCE]);

    let output = sn7meta(dir.path(), &["ingest", "--pixel-csv", &csv, "--dry-run", "--json"]);
    assert!(output.status.success());

    let data = &json_stdout(&output)["data"];
    assert_eq!(data["dry_run"], true);
    assert!(data["load"].is_null());
}

#[test]
fn test_ingest_with_no_valid_rows_fails() {
    let dir = TempDir::new().unwrap();
    let csv = write_pixel_csv(dir.path(), &["broken", "also_broken"]);

    let output = sn7meta(dir.path(), &["ingest", "--pixel-csv", &csv]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no rows"));
}

#[test]
fn test_ingest_abort_policy_fails_on_bad_row() {
    let dir = TempDir::new().unwrap();
    let csv = write_pixel_csv(dir.path(), &[REFERENCE, "broken"]);

    let output = sn7meta(dir.path(), &["ingest", "--pixel-csv", &csv, "--on-row-error", "abort"]);
    assert!(!output.status.success());
}

#[test]
fn test_ingest_requires_pixel_csv() {
    let dir = TempDir::new().unwrap();
    let output = sn7meta(dir.path(), &["ingest"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("pixel_csv"));
}
