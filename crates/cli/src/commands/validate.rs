//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CoordinatorConfig, TracerKind, TransportKind};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    service: String,
    endpoint_count: usize,
    max_attempts: u32,
    timeout_ms: u64,
    tracer: String,
    transport: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    service: config.service.name.clone(),
                    endpoint_count: config.probe.endpoints.len(),
                    max_attempts: config.resilience.max_attempts,
                    timeout_ms: config.resilience.timeout_ms,
                    tracer: format!("{:?}", config.telemetry.tracer),
                    transport: format!("{} ({:?})", config.transport.name, config.transport.kind),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &CoordinatorConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.sizing.fallback_latency_ms.is_none() {
        warnings.push(
            "sizing.fallback_latency_ms is not set - dispatch fails when every probe fails"
                .to_string(),
        );
    }

    if config.telemetry.tracer == TracerKind::Otel && config.telemetry.exporters.is_empty() {
        warnings.push("telemetry.tracer is otel but no exporters are configured".to_string());
    }

    if config.telemetry.tracer != TracerKind::Otel && !config.telemetry.exporters.is_empty() {
        warnings.push(format!(
            "telemetry.exporters are ignored with tracer {:?}",
            config.telemetry.tracer
        ));
    }

    if config.resilience.max_attempts == 1 {
        warnings.push("resilience.max_attempts is 1 - failed sends are never retried".to_string());
    }

    if config.transport.kind == TransportKind::Log {
        warnings.push("transport is log - batches are only written to the log".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Service: {}", summary.service);
            println!("  Probe endpoints: {}", summary.endpoint_count);
            println!("  Max attempts: {}", summary.max_attempts);
            println!("  Timeout: {}ms", summary.timeout_ms);
            println!("  Tracer: {}", summary.tracer);
            println!("  Transport: {}", summary.transport);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args_for(file: &NamedTempFile) -> ValidateArgs {
        ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        }
    }

    fn toml_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_has_summary() {
        let file = toml_file(
            r#"
[service]
name = "orders"

[sizing]
fallback_latency_ms = 50.0

[transport]
name = "udp"
kind = "network"
params = { addr = "127.0.0.1:9000" }
"#,
        );

        let result = validate_config(&args_for(&file));
        assert!(result.valid, "{:?}", result.error);
        let summary = result.summary.unwrap();
        assert_eq!(summary.service, "orders");
        assert!(result.warnings.is_none());
    }

    #[test]
    fn test_defaults_produce_warnings() {
        let file = toml_file("");
        let result = validate_config(&args_for(&file));
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("fallback_latency_ms")));
        assert!(warnings.iter().any(|w| w.contains("transport is log")));
    }

    #[test]
    fn test_invalid_config_reports_error() {
        let file = toml_file("[resilience]\nmax_attempts = 0\n");
        let result = validate_config(&args_for(&file));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("resilience.max_attempts"));
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/dispatch-coord.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(run_validate(&args).is_err());
    }
}
