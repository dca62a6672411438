//! Tracer backends

mod memory;
mod noop;
#[cfg(feature = "otel")]
mod otel;
mod tracing_span;

pub use memory::{InMemorySpan, InMemoryTracer, RecordedSpan};
pub use noop::NoopTracer;
#[cfg(feature = "otel")]
pub use otel::{OtelSpan, OtelTracer};
pub use tracing_span::TracingTracer;
