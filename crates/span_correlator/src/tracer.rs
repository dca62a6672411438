//! CorrelationTracer - injected tracing handle

use std::fmt::Display;

use contracts::{CoordError, Token};

use crate::flatten::TagValue;

/// Span context built from a unit of work's identity
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedContext {
    pub trace_id: Token,
    pub span_id: Token,
    /// Always `true` on this path
    pub sampled: bool,
    /// Always `None`: correlated spans are roots
    pub parent: Option<Token>,
}

/// Everything a backend needs to open one span
#[derive(Debug, Clone, PartialEq)]
pub struct SpanRequest {
    pub name: String,
    pub context: CorrelatedContext,
    /// Service attributes first, then flattened tags; keys are unique
    pub attributes: Vec<(String, TagValue)>,
}

impl SpanRequest {
    pub fn attribute(&self, key: &str) -> Option<&TagValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Handle to an opened span.
///
/// Ending the span belongs to the backend (usually on drop).
pub trait CorrelatedSpan: Send {
    /// Annotate the span with the outcome of the work it covers
    fn record_result<T, E: Display>(&mut self, result: &Result<T, E>);

    /// `tracing` span that log events of the covered work nest under;
    /// disabled for backends outside `tracing`
    fn log_span(&self) -> tracing::Span {
        tracing::Span::none()
    }
}

impl CorrelatedSpan for () {
    fn record_result<T, E: Display>(&mut self, _result: &Result<T, E>) {}
}

/// Tracing backend handed to the correlator at construction
pub trait CorrelationTracer: Send + Sync {
    type Span: CorrelatedSpan;

    /// Open a span with exactly the given context.
    ///
    /// # Errors
    /// `CoordError::InvalidTraceContext` when the backend cannot use the ids.
    fn open_span(&self, request: SpanRequest) -> Result<Self::Span, CoordError>;
}
