//! In-memory tracer: keeps every span request and its outcome

use std::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::CoordError;

use crate::tracer::{CorrelatedSpan, CorrelationTracer, SpanRequest};

/// One span opened through an [`InMemoryTracer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSpan {
    pub request: SpanRequest,
    /// `None` until the holder records a result
    pub outcome: Option<Result<(), String>>,
}

type Store = Arc<Mutex<Vec<RecordedSpan>>>;

/// Tracer recording span requests; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct InMemoryTracer {
    spans: Store,
}

impl InMemoryTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every span opened so far, in order
    pub fn spans(&self) -> Vec<RecordedSpan> {
        lock(&self.spans).clone()
    }

    pub fn clear(&self) {
        lock(&self.spans).clear();
    }
}

impl CorrelationTracer for InMemoryTracer {
    type Span = InMemorySpan;

    fn open_span(&self, request: SpanRequest) -> Result<InMemorySpan, CoordError> {
        let mut spans = lock(&self.spans);
        spans.push(RecordedSpan {
            request,
            outcome: None,
        });
        Ok(InMemorySpan {
            index: spans.len() - 1,
            spans: self.spans.clone(),
        })
    }
}

/// Handle to a recorded span
#[derive(Debug)]
pub struct InMemorySpan {
    index: usize,
    spans: Store,
}

impl CorrelatedSpan for InMemorySpan {
    fn record_result<T, E: Display>(&mut self, result: &Result<T, E>) {
        if let Some(span) = lock(&self.spans).get_mut(self.index) {
            span.outcome = Some(match result {
                Ok(_) => Ok(()),
                Err(e) => Err(e.to_string()),
            });
        }
    }
}

fn lock(spans: &Store) -> MutexGuard<'_, Vec<RecordedSpan>> {
    spans.lock().unwrap_or_else(PoisonError::into_inner)
}
