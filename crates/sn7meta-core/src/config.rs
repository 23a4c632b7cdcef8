use crate::error::{Result, Sn7Error};
use crate::models::{Hemisphere, UtmZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Which UTM zone chip geometries are projected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    /// One configured zone for the whole batch
    #[default]
    Fixed,
    /// Each chip's own zone from its filename
    Chip,
}

/// How chips are associated with AOIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AoiStrategy {
    /// Attribute join on the AOI identifier parsed from the filename
    #[default]
    Identifier,
    /// Point-in-polygon join of chip centroids against AOI boundaries
    Spatial,
}

/// Spatial-join behaviour when a centroid falls inside several AOIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Assign the first matching AOI in table row order
    #[default]
    First,
    /// Emit one row per matching AOI
    All,
    /// Reject the row
    Reject,
}

/// What the pipeline does with a row that fails parsing or geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Record the row as rejected and continue
    #[default]
    Skip,
    /// Fail the whole batch on the first bad row
    Abort,
}

/// Projection target resolved from the layered configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionTarget {
    Fixed(UtmZone),
    ChipZone(Hemisphere),
}

/// Validated settings for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub projection: ProjectionTarget,
    pub aoi_strategy: AoiStrategy,
    pub overlap_policy: OverlapPolicy,
    pub row_error_policy: RowErrorPolicy,
    /// Build AOI boundaries from chip centroids when no boundary file is given
    pub synthesize_aoi: bool,
    /// Property holding the AOI identifier in boundary files
    pub aoi_id_property: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionTarget::Fixed(UtmZone::default()),
            aoi_strategy: AoiStrategy::Identifier,
            overlap_policy: OverlapPolicy::First,
            row_error_policy: RowErrorPolicy::Skip,
            synthesize_aoi: true,
            aoi_id_property: "aoi_id".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.aoi_id_property.trim().is_empty() {
            return Err(Sn7Error::ConfigInvalid {
                key: "aoi_id_property".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Input locations for an ingestion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub pixel_csv: PathBuf,
    pub aoi_path: Option<PathBuf>,
}

/// Layered configuration for sn7meta
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub utm_zone: ConfigValue<u32>,
    pub hemisphere: ConfigValue<Hemisphere>,
    pub projection: ConfigValue<ProjectionMode>,
    pub aoi_strategy: ConfigValue<AoiStrategy>,
    pub overlap_policy: ConfigValue<OverlapPolicy>,
    pub row_error_policy: ConfigValue<RowErrorPolicy>,
    pub synthesize_aoi: ConfigValue<bool>,
    pub aoi_id_property: ConfigValue<String>,
    pub pixel_csv: ConfigValue<Option<PathBuf>>,
    pub aoi_path: ConfigValue<Option<PathBuf>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            utm_zone: ConfigValue::new(13, ConfigSource::Default),
            hemisphere: ConfigValue::new(Hemisphere::North, ConfigSource::Default),
            projection: ConfigValue::new(ProjectionMode::Fixed, ConfigSource::Default),
            aoi_strategy: ConfigValue::new(AoiStrategy::Identifier, ConfigSource::Default),
            overlap_policy: ConfigValue::new(OverlapPolicy::First, ConfigSource::Default),
            row_error_policy: ConfigValue::new(RowErrorPolicy::Skip, ConfigSource::Default),
            synthesize_aoi: ConfigValue::new(true, ConfigSource::Default),
            aoi_id_property: ConfigValue::new("aoi_id".to_string(), ConfigSource::Default),
            pixel_csv: ConfigValue::new(None, ConfigSource::Default),
            aoi_path: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Sn7Error::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| Sn7Error::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(zone) = file_config.utm_zone {
            self.utm_zone.update(zone, ConfigSource::File);
        }
        if let Some(hemisphere) = file_config.hemisphere {
            self.hemisphere.update(hemisphere, ConfigSource::File);
        }
        if let Some(projection) = file_config.projection {
            self.projection.update(projection, ConfigSource::File);
        }
        if let Some(strategy) = file_config.aoi_strategy {
            self.aoi_strategy.update(strategy, ConfigSource::File);
        }
        if let Some(policy) = file_config.overlap_policy {
            self.overlap_policy.update(policy, ConfigSource::File);
        }
        if let Some(policy) = file_config.row_error_policy {
            self.row_error_policy.update(policy, ConfigSource::File);
        }
        if let Some(synthesize) = file_config.synthesize_aoi {
            self.synthesize_aoi.update(synthesize, ConfigSource::File);
        }
        if let Some(property) = file_config.aoi_id_property {
            self.aoi_id_property.update(property, ConfigSource::File);
        }
        if let Some(path) = file_config.pixel_csv {
            self.pixel_csv.update(Some(path), ConfigSource::File);
        }
        if let Some(path) = file_config.aoi_path {
            self.aoi_path.update(Some(path), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from `SN7_*` environment variables
    pub fn load_from_env(mut self) -> Self {
        if let Ok(zone_str) = env::var("SN7_UTM_ZONE") {
            match zone_str.parse::<u32>() {
                Ok(zone) => self.utm_zone.update(zone, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SN7_UTM_ZONE value '{}': expected integer zone number",
                    zone_str
                ),
            }
        }

        if let Ok(value) = env::var("SN7_HEMISPHERE") {
            match parse_hemisphere(&value) {
                Ok(h) => self.hemisphere.update(h, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring SN7_HEMISPHERE: {}", e),
            }
        }

        if let Ok(value) = env::var("SN7_PROJECTION") {
            match parse_projection_mode(&value) {
                Ok(mode) => self.projection.update(mode, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring SN7_PROJECTION: {}", e),
            }
        }

        if let Ok(value) = env::var("SN7_AOI_STRATEGY") {
            match parse_aoi_strategy(&value) {
                Ok(strategy) => self.aoi_strategy.update(strategy, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring SN7_AOI_STRATEGY: {}", e),
            }
        }

        if let Ok(value) = env::var("SN7_OVERLAP_POLICY") {
            match parse_overlap_policy(&value) {
                Ok(policy) => self.overlap_policy.update(policy, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring SN7_OVERLAP_POLICY: {}", e),
            }
        }

        if let Ok(value) = env::var("SN7_ROW_ERROR_POLICY") {
            match parse_row_error_policy(&value) {
                Ok(policy) => self.row_error_policy.update(policy, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring SN7_ROW_ERROR_POLICY: {}", e),
            }
        }

        if let Ok(value) = env::var("SN7_SYNTHESIZE_AOI") {
            match value.to_lowercase().parse::<bool>() {
                Ok(flag) => self.synthesize_aoi.update(flag, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid SN7_SYNTHESIZE_AOI value '{}': expected true or false",
                    value
                ),
            }
        }

        if let Ok(property) = env::var("SN7_AOI_ID_PROPERTY") {
            self.aoi_id_property.update(property, ConfigSource::Environment);
        }

        if let Ok(path) = env::var("SN7_PIXEL_CSV") {
            self.pixel_csv.update(Some(PathBuf::from(path)), ConfigSource::Environment);
        }

        if let Ok(path) = env::var("SN7_AOI_PATH") {
            self.aoi_path.update(Some(PathBuf::from(path)), ConfigSource::Environment);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(zone) = overrides.utm_zone {
            self.utm_zone.update(zone, ConfigSource::Cli);
        }
        if let Some(hemisphere) = overrides.hemisphere {
            self.hemisphere.update(hemisphere, ConfigSource::Cli);
        }
        if let Some(projection) = overrides.projection {
            self.projection.update(projection, ConfigSource::Cli);
        }
        if let Some(strategy) = overrides.aoi_strategy {
            self.aoi_strategy.update(strategy, ConfigSource::Cli);
        }
        if let Some(policy) = overrides.overlap_policy {
            self.overlap_policy.update(policy, ConfigSource::Cli);
        }
        if let Some(policy) = overrides.row_error_policy {
            self.row_error_policy.update(policy, ConfigSource::Cli);
        }
        if let Some(synthesize) = overrides.synthesize_aoi {
            self.synthesize_aoi.update(synthesize, ConfigSource::Cli);
        }
        if let Some(property) = overrides.aoi_id_property {
            self.aoi_id_property.update(property, ConfigSource::Cli);
        }
        if let Some(path) = overrides.pixel_csv {
            self.pixel_csv.update(Some(path), ConfigSource::Cli);
        }
        if let Some(path) = overrides.aoi_path {
            self.aoi_path.update(Some(path), ConfigSource::Cli);
        }
    }

    /// Resolve into a validated [`PipelineConfig`]
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let projection = match self.projection.value {
            ProjectionMode::Fixed => {
                let zone = UtmZone::new(self.utm_zone.value, self.hemisphere.value).map_err(
                    |e| Sn7Error::ConfigInvalid { key: "utm_zone".to_string(), reason: e.to_string() },
                )?;
                ProjectionTarget::Fixed(zone)
            }
            ProjectionMode::Chip => ProjectionTarget::ChipZone(self.hemisphere.value),
        };

        let config = PipelineConfig {
            projection,
            aoi_strategy: self.aoi_strategy.value,
            overlap_policy: self.overlap_policy.value,
            row_error_policy: self.row_error_policy.value,
            synthesize_aoi: self.synthesize_aoi.value,
            aoi_id_property: self.aoi_id_property.value.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the input locations, failing if the pixel CSV is not configured
    pub fn source_config(&self) -> Result<SourceConfig> {
        let pixel_csv = self
            .pixel_csv
            .value
            .clone()
            .ok_or_else(|| Sn7Error::ConfigMissing { key: "pixel_csv".to_string() })?;

        Ok(SourceConfig { pixel_csv, aoi_path: self.aoi_path.value.clone() })
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert("utm_zone".to_string(), (self.utm_zone.value.to_string(), self.utm_zone.source));
        map.insert(
            "hemisphere".to_string(),
            (format!("{:?}", self.hemisphere.value), self.hemisphere.source),
        );
        map.insert(
            "projection".to_string(),
            (format!("{:?}", self.projection.value), self.projection.source),
        );
        map.insert(
            "aoi_strategy".to_string(),
            (format!("{:?}", self.aoi_strategy.value), self.aoi_strategy.source),
        );
        map.insert(
            "overlap_policy".to_string(),
            (format!("{:?}", self.overlap_policy.value), self.overlap_policy.source),
        );
        map.insert(
            "row_error_policy".to_string(),
            (format!("{:?}", self.row_error_policy.value), self.row_error_policy.source),
        );
        map.insert(
            "synthesize_aoi".to_string(),
            (self.synthesize_aoi.value.to_string(), self.synthesize_aoi.source),
        );
        map.insert(
            "aoi_id_property".to_string(),
            (self.aoi_id_property.value.clone(), self.aoi_id_property.source),
        );
        map.insert("pixel_csv".to_string(), (display_path(&self.pixel_csv.value), self.pixel_csv.source));
        map.insert("aoi_path".to_string(), (display_path(&self.aoi_path.value), self.aoi_path.source));

        map
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string())
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    utm_zone: Option<u32>,
    hemisphere: Option<Hemisphere>,
    projection: Option<ProjectionMode>,
    aoi_strategy: Option<AoiStrategy>,
    overlap_policy: Option<OverlapPolicy>,
    row_error_policy: Option<RowErrorPolicy>,
    synthesize_aoi: Option<bool>,
    aoi_id_property: Option<String>,
    pixel_csv: Option<PathBuf>,
    aoi_path: Option<PathBuf>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub utm_zone: Option<u32>,
    pub hemisphere: Option<Hemisphere>,
    pub projection: Option<ProjectionMode>,
    pub aoi_strategy: Option<AoiStrategy>,
    pub overlap_policy: Option<OverlapPolicy>,
    pub row_error_policy: Option<RowErrorPolicy>,
    pub synthesize_aoi: Option<bool>,
    pub aoi_id_property: Option<String>,
    pub pixel_csv: Option<PathBuf>,
    pub aoi_path: Option<PathBuf>,
}

fn invalid(key: &str, value: &str, expected: &str) -> Sn7Error {
    Sn7Error::ConfigInvalid {
        key: key.to_string(),
        reason: format!("Invalid value '{}'. Use {}", value, expected),
    }
}

/// Parse hemisphere from string
pub fn parse_hemisphere(s: &str) -> Result<Hemisphere> {
    match s.to_lowercase().as_str() {
        "north" | "n" => Ok(Hemisphere::North),
        "south" | "s" => Ok(Hemisphere::South),
        _ => Err(invalid("hemisphere", s, "north or south")),
    }
}

/// Parse projection mode from string
pub fn parse_projection_mode(s: &str) -> Result<ProjectionMode> {
    match s.to_lowercase().as_str() {
        "fixed" => Ok(ProjectionMode::Fixed),
        "chip" => Ok(ProjectionMode::Chip),
        _ => Err(invalid("projection", s, "fixed or chip")),
    }
}

/// Parse AOI strategy from string
pub fn parse_aoi_strategy(s: &str) -> Result<AoiStrategy> {
    match s.to_lowercase().as_str() {
        "identifier" | "id" => Ok(AoiStrategy::Identifier),
        "spatial" => Ok(AoiStrategy::Spatial),
        _ => Err(invalid("aoi_strategy", s, "identifier or spatial")),
    }
}

/// Parse overlap policy from string
pub fn parse_overlap_policy(s: &str) -> Result<OverlapPolicy> {
    match s.to_lowercase().as_str() {
        "first" => Ok(OverlapPolicy::First),
        "all" => Ok(OverlapPolicy::All),
        "reject" => Ok(OverlapPolicy::Reject),
        _ => Err(invalid("overlap_policy", s, "first, all, or reject")),
    }
}

/// Parse row error policy from string
pub fn parse_row_error_policy(s: &str) -> Result<RowErrorPolicy> {
    match s.to_lowercase().as_str() {
        "skip" => Ok(RowErrorPolicy::Skip),
        "abort" => Ok(RowErrorPolicy::Abort),
        _ => Err(invalid("row_error_policy", s, "skip or abort")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.utm_zone.value, 13);
        assert_eq!(config.utm_zone.source, ConfigSource::Default);
        assert_eq!(config.overlap_policy.value, OverlapPolicy::First);
        assert!(config.synthesize_aoi.value);

        let pipeline = config.pipeline_config().unwrap();
        assert_eq!(pipeline, PipelineConfig::default());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(13, ConfigSource::Default);

        value.update(14, ConfigSource::File);
        assert_eq!(value.value, 14);

        value.update(15, ConfigSource::Environment);
        assert_eq!(value.value, 15);

        value.update(16, ConfigSource::Cli);
        assert_eq!(value.value, 16);

        // Lower precedence should not override
        value.update(17, ConfigSource::File);
        assert_eq!(value.value, 16);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
utm_zone = 18
hemisphere = "south"
projection = "chip"
aoi_strategy = "spatial"
overlap_policy = "reject"
pixel_csv = "/data/sn7_train_ground_truth_pix.csv"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.utm_zone.value, 18);
        assert_eq!(config.utm_zone.source, ConfigSource::File);
        assert_eq!(config.hemisphere.value, Hemisphere::South);
        assert_eq!(config.aoi_strategy.value, AoiStrategy::Spatial);
        assert_eq!(config.overlap_policy.value, OverlapPolicy::Reject);

        let pipeline = config.pipeline_config().unwrap();
        assert_eq!(pipeline.projection, ProjectionTarget::ChipZone(Hemisphere::South));

        let sources = config.source_config().unwrap();
        assert_eq!(sources.pixel_csv, PathBuf::from("/data/sn7_train_ground_truth_pix.csv"));
        assert!(sources.aoi_path.is_none());
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "overlap_policy = \"sometimes\"").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(Sn7Error::ConfigInvalid { .. })));
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        env::set_var("SN7_UTM_ZONE", "33");
        env::set_var("SN7_OVERLAP_POLICY", "all");
        env::set_var("SN7_ROW_ERROR_POLICY", "bogus");

        let config = LayeredConfig::with_defaults().load_from_env();

        env::remove_var("SN7_UTM_ZONE");
        env::remove_var("SN7_OVERLAP_POLICY");
        env::remove_var("SN7_ROW_ERROR_POLICY");

        assert_eq!(config.utm_zone.value, 33);
        assert_eq!(config.utm_zone.source, ConfigSource::Environment);
        assert_eq!(config.overlap_policy.value, OverlapPolicy::All);
        // Invalid values are ignored with a warning
        assert_eq!(config.row_error_policy.value, RowErrorPolicy::Skip);
        assert_eq!(config.row_error_policy.source, ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            utm_zone: Some(48),
            overlap_policy: Some(OverlapPolicy::All),
            ..Default::default()
        });

        assert_eq!(config.utm_zone.value, 48);
        assert_eq!(config.utm_zone.source, ConfigSource::Cli);
        assert_eq!(config.overlap_policy.value, OverlapPolicy::All);
        assert_eq!(config.aoi_strategy.source, ConfigSource::Default);
    }

    #[test]
    fn test_invalid_zone_fails_eagerly() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides { utm_zone: Some(61), ..Default::default() });

        let err = config.pipeline_config().unwrap_err();
        assert!(matches!(err, Sn7Error::ConfigInvalid { ref key, .. } if key == "utm_zone"));
    }

    #[test]
    fn test_missing_pixel_csv() {
        let config = LayeredConfig::with_defaults();
        let err = config.source_config().unwrap_err();
        assert!(matches!(err, Sn7Error::ConfigMissing { ref key } if key == "pixel_csv"));
    }

    #[test]
    fn test_empty_aoi_property_is_invalid() {
        let config = PipelineConfig { aoi_id_property: " ".to_string(), ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parsers() {
        assert_eq!(parse_hemisphere("S").unwrap(), Hemisphere::South);
        assert_eq!(parse_projection_mode("CHIP").unwrap(), ProjectionMode::Chip);
        assert_eq!(parse_aoi_strategy("id").unwrap(), AoiStrategy::Identifier);
        assert_eq!(parse_overlap_policy("reject").unwrap(), OverlapPolicy::Reject);
        assert_eq!(parse_row_error_policy("abort").unwrap(), RowErrorPolicy::Abort);
        assert!(parse_overlap_policy("sometimes").is_err());
    }

    #[test]
    fn test_inspection_map() {
        let map = LayeredConfig::with_defaults().to_inspection_map();

        let (zone, source) = &map["utm_zone"];
        assert_eq!(zone, "13");
        assert_eq!(*source, ConfigSource::Default);
        assert_eq!(map["pixel_csv"].0, "-");
    }
}
