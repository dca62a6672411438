//! Layered error definitions
//!
//! Categorized by source: identity / probe / execution / trace / config / transport

use thiserror::Error;

/// Deadline exceeded by an operation wrapped in a timeout race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation timed out after {timeout_ms}ms")]
pub struct TimeoutError {
    pub timeout_ms: u64,
}

impl TimeoutError {
    pub fn new(timeout: std::time::Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum CoordError {
    // ===== Identity Errors =====
    /// Identity built without a unit-of-work type
    #[error("message type is missing in headers")]
    MissingType,

    // ===== Probe Errors =====
    /// Every latency probe in one fan-out round failed
    #[error("all {attempted} latency probes failed: {failures:?}")]
    ProbeExhaustion {
        attempted: usize,
        failures: Vec<String>,
    },

    /// A single probe failed (excluded from the reduction)
    #[error("latency probe to '{endpoint}' failed: {message}")]
    Probe { endpoint: String, message: String },

    // ===== Execution Errors =====
    /// Deadline exceeded
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    // ===== Trace Errors =====
    /// Span correlation preconditions not met
    #[error("invalid trace context: {reason}")]
    InvalidTraceContext { reason: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Payload Errors =====
    /// Schema collaborator rejected the payload
    #[error("validation failed for {schema_type}: \n{}", .violations.join("\n"))]
    Validation {
        schema_type: String,
        violations: Vec<String>,
    },

    // ===== Transport Errors =====
    /// Transport send error
    #[error("transport '{transport}' send error: {message}")]
    Transport { transport: String, message: String },

    /// Transport connection error
    #[error("transport '{transport}' connection error: {message}")]
    TransportConnection { transport: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl CoordError {
    /// Create invalid trace context error
    pub fn invalid_trace_context(reason: impl Into<String>) -> Self {
        Self::InvalidTraceContext {
            reason: reason.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create probe error
    pub fn probe(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Probe {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create transport send error
    pub fn transport(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Timeouts report `false`: a timeout is only retried when the caller
    /// opts into per-attempt deadlines.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ProbeExhaustion { .. }
                | Self::Probe { .. }
                | Self::Transport { .. }
                | Self::TransportConnection { .. }
                | Self::Io(_)
        )
    }

    /// Whether this error is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
