//! Integration tests for layered configuration
//!
//! Precedence: CLI arguments > Environment variables > Config file > Defaults

use sn7meta_core::config::{
    AoiStrategy, CliConfigOverrides, ConfigSource, LayeredConfig, OverlapPolicy, ProjectionTarget,
    RowErrorPolicy,
};
use sn7meta_core::models::{Hemisphere, UtmZone};
use sn7meta_core::Sn7Error;
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", contents).unwrap();
    file
}

#[test]
fn test_partial_file_keeps_defaults() {
    let file = config_file("overlap_policy = \"all\"\n# everything else stays default");

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.overlap_policy.value, OverlapPolicy::All);
    assert_eq!(config.overlap_policy.source, ConfigSource::File);
    assert_eq!(config.utm_zone.source, ConfigSource::Default);
    assert_eq!(config.aoi_strategy.value, AoiStrategy::Identifier);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let file = config_file("utm_zone = 18\nrow_error_policy = \"abort\"");
    env::set_var("SN7_UTM_ZONE", "20");

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();
    env::remove_var("SN7_UTM_ZONE");

    assert_eq!(config.utm_zone.value, 20);
    assert_eq!(config.utm_zone.source, ConfigSource::Environment);
    assert_eq!(config.row_error_policy.value, RowErrorPolicy::Abort);
    assert_eq!(config.row_error_policy.source, ConfigSource::File);
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    let file = config_file("hemisphere = \"north\"\npixel_csv = \"/from/file.csv\"");
    env::set_var("SN7_HEMISPHERE", "north");
    env::set_var("SN7_PIXEL_CSV", "/from/env.csv");

    let mut config =
        LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();
    env::remove_var("SN7_HEMISPHERE");
    env::remove_var("SN7_PIXEL_CSV");

    config.update_from_cli(CliConfigOverrides {
        hemisphere: Some(Hemisphere::South),
        pixel_csv: Some(PathBuf::from("/from/cli.csv")),
        ..Default::default()
    });

    assert_eq!(config.hemisphere.source, ConfigSource::Cli);
    assert_eq!(config.source_config().unwrap().pixel_csv, PathBuf::from("/from/cli.csv"));

    let pipeline = config.pipeline_config().unwrap();
    assert_eq!(
        pipeline.projection,
        ProjectionTarget::Fixed(UtmZone::new(13, Hemisphere::South).unwrap())
    );
}

#[test]
fn test_missing_file_is_config_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/sn7meta.toml");
    assert!(matches!(result, Err(Sn7Error::ConfigInvalid { .. })));
}

#[test]
fn test_inspection_map_tracks_sources() {
    let file = config_file("aoi_strategy = \"spatial\"");
    let mut config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
    config.update_from_cli(CliConfigOverrides { utm_zone: Some(33), ..Default::default() });

    let map = config.to_inspection_map();
    assert_eq!(map["aoi_strategy"], ("Spatial".to_string(), ConfigSource::File));
    assert_eq!(map["utm_zone"], ("33".to_string(), ConfigSource::Cli));
    assert_eq!(map["overlap_policy"].1, ConfigSource::Default);
}
