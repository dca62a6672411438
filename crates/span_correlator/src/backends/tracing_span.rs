//! `tracing` backend: correlated spans as `tracing::Span`

use std::fmt::Display;

use contracts::CoordError;
use serde_json::{Map, Value};
use tracing::{field, info_span, Span};

use crate::tracer::{CorrelatedSpan, CorrelationTracer, SpanRequest};

/// Opens an INFO `correlated_span` carrying the ids and the tags as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

impl CorrelationTracer for TracingTracer {
    type Span = Span;

    fn open_span(&self, request: SpanRequest) -> Result<Span, CoordError> {
        let tags: Map<String, Value> = request
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
            .collect();
        let tags = Value::Object(tags).to_string();

        // No parent: detach from whatever span is current
        let span = info_span!(
            parent: None,
            "correlated_span",
            otel.name = %request.name,
            trace_id = %request.context.trace_id,
            span_id = %request.context.span_id,
            sampled = request.context.sampled,
            tags = %tags,
            status = field::Empty,
            error.message = field::Empty,
        );
        Ok(span)
    }
}

impl CorrelatedSpan for Span {
    fn record_result<T, E: Display>(&mut self, result: &Result<T, E>) {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }

    fn log_span(&self) -> Span {
        self.clone()
    }
}
