//! # Span Correlator
//!
//! Opens a root span keyed by a unit of work's identity:
//! `trace_id = Identity.traceId`, `span_id = RecordKey.recordId`.
//!
//! The tracer is an injected handle ([`CorrelationTracer`]); this crate never
//! touches process-wide tracing state. Backends:
//! - [`NoopTracer`]
//! - [`InMemoryTracer`] (records span requests, for tests)
//! - [`TracingTracer`] (`tracing` span)
//! - `OtelTracer` (OpenTelemetry, `otel` feature)

mod backends;
mod correlator;
mod flatten;
mod tracer;

#[cfg(feature = "otel")]
pub mod telemetry;

pub use backends::{InMemorySpan, InMemoryTracer, NoopTracer, RecordedSpan, TracingTracer};
#[cfg(feature = "otel")]
pub use backends::{OtelSpan, OtelTracer};
pub use correlator::{
    SpanCorrelator, ATTR_CLIENT_ID, ATTR_EVENT_NAME, ATTR_GROUP_ID, ATTR_MESSAGE_SYSTEM,
};
pub use flatten::{flatten, TagValue};
pub use tracer::{CorrelatedContext, CorrelatedSpan, CorrelationTracer, SpanRequest};
