//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (validator derive): 范围、非空列表
//! - probe 端点非空
//! - sizing 回退延迟为有限值
//! - exporter 名称唯一、端点非空
//! - network 传输必须提供合法的 addr / format

use std::collections::HashSet;
use std::net::SocketAddr;

use ::validator::{Validate, ValidationErrors, ValidationErrorsKind};
use contracts::{CoordError, CoordinatorConfig, TransportKind};

/// 校验 CoordinatorConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &CoordinatorConfig) -> Result<(), CoordError> {
    validate_fields(config)?;
    validate_probe_endpoints(config)?;
    validate_fallback_latency(config)?;
    validate_exporters(config)?;
    validate_transport(config)?;
    Ok(())
}

/// 字段级约束
fn validate_fields(config: &CoordinatorConfig) -> Result<(), CoordError> {
    let Err(errors) = config.validate() else {
        return Ok(());
    };

    let mut violations = Vec::new();
    collect_violations("", &errors, &mut violations);
    violations.sort();

    let field = violations
        .first()
        .map(|(path, _)| path.clone())
        .unwrap_or_default();
    let message = violations
        .iter()
        .map(|(path, msg)| format!("{path}: {msg}"))
        .collect::<Vec<_>>()
        .join("; ");
    Err(CoordError::config_validation(field, message))
}

fn collect_violations(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", e.code));
                    out.push((path.clone(), msg));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_violations(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    collect_violations(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

/// 校验探测端点
fn validate_probe_endpoints(config: &CoordinatorConfig) -> Result<(), CoordError> {
    for (idx, endpoint) in config.probe.endpoints.iter().enumerate() {
        if endpoint.trim().is_empty() {
            return Err(CoordError::config_validation(
                format!("probe.endpoints[{}]", idx),
                "endpoint cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 校验回退延迟
fn validate_fallback_latency(config: &CoordinatorConfig) -> Result<(), CoordError> {
    if let Some(latency) = config.sizing.fallback_latency_ms {
        if !latency.is_finite() {
            return Err(CoordError::config_validation(
                "sizing.fallback_latency_ms",
                format!("fallback_latency_ms must be finite, got {latency}"),
            ));
        }
    }
    Ok(())
}

/// 校验 exporter 配置
fn validate_exporters(config: &CoordinatorConfig) -> Result<(), CoordError> {
    let mut seen = HashSet::new();
    for (idx, exporter) in config.telemetry.exporters.iter().enumerate() {
        if !seen.insert(exporter.name.as_str()) {
            return Err(CoordError::config_validation(
                format!("telemetry.exporters[name={}]", exporter.name),
                "duplicate exporter name",
            ));
        }
        if exporter.endpoint.trim().is_empty() {
            return Err(CoordError::config_validation(
                format!("telemetry.exporters[{}].endpoint", idx),
                "exporter endpoint cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 校验传输配置
fn validate_transport(config: &CoordinatorConfig) -> Result<(), CoordError> {
    let transport = &config.transport;
    if transport.kind != TransportKind::Network {
        return Ok(());
    }

    let addr = transport.params.get("addr").ok_or_else(|| {
        CoordError::config_validation(
            "transport.params.addr",
            "network transport requires 'addr'",
        )
    })?;
    if addr.parse::<SocketAddr>().is_err() {
        return Err(CoordError::config_validation(
            "transport.params.addr",
            format!("invalid socket address '{addr}'"),
        ));
    }

    if let Some(format) = transport.params.get("format") {
        if !matches!(format.as_str(), "json" | "bincode") {
            return Err(CoordError::config_validation(
                "transport.params.format",
                format!("unknown format '{format}', expected json or bincode"),
            ));
        }
    }

    Ok(())
}
