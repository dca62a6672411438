//! OpenTelemetry backend (`otel` feature)

use std::borrow::Cow;
use std::fmt::Display;

use contracts::CoordError;
use opentelemetry::trace::{Span as _, SpanId, SpanKind, Status, TraceId, Tracer, TracerProvider};
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::trace::{SdkTracer, SdkTracerProvider};

use crate::flatten::TagValue;
use crate::tracer::{CorrelatedSpan, CorrelationTracer, SpanRequest};

/// Opens OpenTelemetry spans with explicit trace/span ids, kind Internal,
/// no parent
#[derive(Debug, Clone)]
pub struct OtelTracer<T = SdkTracer> {
    tracer: T,
}

impl<T> OtelTracer<T> {
    pub fn new(tracer: T) -> Self {
        Self { tracer }
    }
}

impl OtelTracer<SdkTracer> {
    /// Tracer named `name` from an explicitly constructed provider
    pub fn from_provider(provider: &SdkTracerProvider, name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(provider.tracer(name))
    }
}

impl<T> CorrelationTracer for OtelTracer<T>
where
    T: Tracer + Send + Sync,
    T::Span: Send,
{
    type Span = OtelSpan<T::Span>;

    fn open_span(&self, request: SpanRequest) -> Result<Self::Span, CoordError> {
        let trace_id = TraceId::from_hex(&request.context.trace_id)
            .ok()
            .filter(|id| *id != TraceId::INVALID)
            .ok_or_else(|| {
                CoordError::invalid_trace_context(format!(
                    "traceId '{}' is not a 32-digit hex id",
                    request.context.trace_id
                ))
            })?;
        let span_id = SpanId::from_hex(&request.context.span_id)
            .ok()
            .filter(|id| *id != SpanId::INVALID)
            .ok_or_else(|| {
                CoordError::invalid_trace_context(format!(
                    "recordId '{}' is not a 16-digit hex id",
                    request.context.span_id
                ))
            })?;

        let attributes: Vec<KeyValue> = request
            .attributes
            .into_iter()
            .filter_map(|(key, value)| key_value(key, value))
            .collect();

        let span = self
            .tracer
            .span_builder(request.name)
            .with_kind(SpanKind::Internal)
            .with_trace_id(trace_id)
            .with_span_id(span_id)
            .with_attributes(attributes)
            .start_with_context(&self.tracer, &Context::new());

        Ok(OtelSpan(span))
    }
}

/// Ends on drop
pub struct OtelSpan<S>(S);

impl<S: opentelemetry::trace::Span + Send> CorrelatedSpan for OtelSpan<S> {
    fn record_result<T, E: Display>(&mut self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.0.set_status(Status::Ok),
            Err(e) => self.0.set_status(Status::error(e.to_string())),
        }
    }
}

fn key_value(key: String, value: TagValue) -> Option<KeyValue> {
    match value {
        TagValue::Null => None,
        TagValue::Bool(b) => Some(KeyValue::new(key, b)),
        TagValue::Int(i) => Some(KeyValue::new(key, i)),
        TagValue::Float(x) => Some(KeyValue::new(key, x)),
        TagValue::Str(s) => Some(KeyValue::new(key, s)),
    }
}
