//! Identity / RecordKey - per-unit-of-work correlation data
//!
//! Built by the `identity` crate; consumed by transports (as headers)
//! and by the span correlator (as trace/span ids).

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{CoordError, Token};

/// Header keys owned by [`Identity`] itself.
pub const CORRELATION_ID_KEY: &str = "correlationId";
pub const TRACE_ID_KEY: &str = "traceId";
pub const TYPE_KEY: &str = "type";

/// Correlation identity of one unit of work.
///
/// Immutable once built. `unit_type` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    correlation_id: Token,
    trace_id: Token,
    #[serde(rename = "type")]
    unit_type: String,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Identity {
    /// Assemble an identity from already-resolved parts.
    ///
    /// Reserved keys present in `extra` are dropped; the explicit
    /// arguments are authoritative here.
    ///
    /// # Errors
    /// `CoordError::MissingType` when `unit_type` is empty.
    pub fn try_new(
        correlation_id: Token,
        trace_id: Token,
        unit_type: impl Into<String>,
        mut extra: Map<String, Value>,
    ) -> Result<Self, CoordError> {
        let unit_type = unit_type.into();
        if unit_type.is_empty() {
            return Err(CoordError::MissingType);
        }
        extra.remove(CORRELATION_ID_KEY);
        extra.remove(TRACE_ID_KEY);
        extra.remove(TYPE_KEY);

        Ok(Self {
            correlation_id,
            trace_id,
            unit_type,
            extra,
        })
    }

    pub fn correlation_id(&self) -> &Token {
        &self.correlation_id
    }

    pub fn trace_id(&self) -> &Token {
        &self.trace_id
    }

    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    /// Caller-supplied fields carried alongside the generated ones
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Flat header object: caller fields plus `correlationId`, `traceId`, `type`.
    pub fn headers(&self) -> Value {
        let mut headers = self.extra.clone();
        headers.insert(
            CORRELATION_ID_KEY.to_string(),
            Value::String(self.correlation_id.to_string()),
        );
        headers.insert(
            TRACE_ID_KEY.to_string(),
            Value::String(self.trace_id.to_string()),
        );
        headers.insert(TYPE_KEY.to_string(), Value::String(self.unit_type.clone()));
        Value::Object(headers)
    }
}

/// Storage key of one record.
///
/// `record_id` and `span_id` are separate fields even though they are
/// currently filled from the same token, so the two id spaces can be
/// split later without changing callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    record_id: Token,
    #[serde(skip)]
    span_id: Token,
}

impl RecordKey {
    /// Key whose record id also serves as the span id
    pub fn new(record_id: Token) -> Self {
        Self {
            span_id: record_id.clone(),
            record_id,
        }
    }

    pub fn record_id(&self) -> &Token {
        &self.record_id
    }

    /// Identifier used for the span opened for this record
    pub fn span_id(&self) -> &Token {
        &self.span_id
    }
}
