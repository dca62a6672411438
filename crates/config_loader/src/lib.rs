//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `CoordinatorConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("coord.toml")).unwrap();
//! println!("Max attempts: {}", config.resilience.max_attempts);
//! ```

mod parser;
mod validator;

pub use contracts::CoordinatorConfig;
pub use parser::ConfigFormat;

use contracts::CoordError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<CoordinatorConfig, CoordError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CoordinatorConfig, CoordError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already built configuration
    pub fn validate(config: &CoordinatorConfig) -> Result<(), CoordError> {
        validator::validate(config)
    }

    /// Serialize CoordinatorConfig to TOML string
    pub fn to_toml(config: &CoordinatorConfig) -> Result<String, CoordError> {
        toml::to_string_pretty(config)
            .map_err(|e| CoordError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize CoordinatorConfig to JSON string
    pub fn to_json(config: &CoordinatorConfig) -> Result<String, CoordError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| CoordError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, CoordError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            CoordError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            CoordError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, CoordError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<CoordinatorConfig, CoordError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_TOML: &str = r#"
[service]
name = "orders-producer"
message_system = "kafka"
group_id = "orders"
client_id = "producer-1"

[probe]
endpoints = ["example.com", "example.org"]
timeout_ms = 1500

[sizing]
fallback_latency_ms = 250.0

[resilience]
max_attempts = 4
initial_delay_ms = 200
timeout_ms = 10000

[telemetry]
tracer = "tracing"

[[telemetry.exporters]]
name = "jaeger"
endpoint = "http://localhost:4317"

[transport]
name = "log"
kind = "log"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.service.name, "orders-producer");
        assert_eq!(config.resilience.max_attempts, 4);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.service.name, config2.service.name);
        assert_eq!(config.probe.endpoints, config2.probe.endpoints);
        assert_eq!(
            config.sizing.fallback_latency_ms,
            config2.sizing.fallback_latency_ms
        );
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(SAMPLE_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.telemetry.exporters.len(), config2.telemetry.exporters.len());
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[telemetry.exporters]]
name = "jaeger"
endpoint = "http://a:4317"

[[telemetry.exporters]]
name = "jaeger"
endpoint = "http://b:4317"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE_TOML.as_bytes()).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.probe.timeout_ms, 1500);
    }

    #[test]
    fn test_load_from_path_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_load_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, CoordError::Io(_)));
    }
}
