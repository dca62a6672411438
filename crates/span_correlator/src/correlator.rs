//! SpanCorrelator - identity + attributes → correlated root span

use contracts::{CoordError, Identity, RecordKey, ServiceConfig};
use serde_json::Value;
use tracing::debug;

use crate::flatten::{flatten, TagValue};
use crate::tracer::{CorrelatedContext, CorrelationTracer, SpanRequest};

pub const ATTR_MESSAGE_SYSTEM: &str = "messageSystem";
pub const ATTR_GROUP_ID: &str = "groupId";
pub const ATTR_CLIENT_ID: &str = "clientId";
pub const ATTR_EVENT_NAME: &str = "eventName";

/// Opens spans correlated with unit-of-work identities
pub struct SpanCorrelator<T> {
    tracer: T,
    service: ServiceConfig,
}

impl<T: CorrelationTracer> SpanCorrelator<T> {
    pub fn new(tracer: T, service: ServiceConfig) -> Self {
        Self { tracer, service }
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }

    /// Open a root span with `trace_id = identity.traceId` and
    /// `span_id = record_key.recordId`, tagged with the service metadata,
    /// `event_name` and the flattened `attributes`.
    ///
    /// # Errors
    /// `CoordError::InvalidTraceContext` if either id is empty; no span is
    /// opened in that case.
    pub fn start_correlated_span(
        &self,
        span_name: &str,
        event_name: &str,
        identity: &Identity,
        record_key: &RecordKey,
        attributes: &Value,
    ) -> Result<T::Span, CoordError> {
        if identity.trace_id().is_empty() {
            return Err(CoordError::invalid_trace_context("traceId is empty"));
        }
        if record_key.span_id().is_empty() {
            return Err(CoordError::invalid_trace_context("recordId is empty"));
        }

        let mut tags = vec![
            (
                ATTR_MESSAGE_SYSTEM.to_string(),
                TagValue::from(self.service.message_system.as_deref()),
            ),
            (
                ATTR_GROUP_ID.to_string(),
                TagValue::from(self.service.group_id.as_deref()),
            ),
            (
                ATTR_CLIENT_ID.to_string(),
                TagValue::from(self.service.client_id.as_deref()),
            ),
            (ATTR_EVENT_NAME.to_string(), TagValue::from(event_name)),
        ];
        // A flattened tag replaces a service attribute of the same key in place
        for (key, value) in flatten(attributes) {
            match tags.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => tags.push((key, value)),
            }
        }

        let request = SpanRequest {
            name: span_name.to_string(),
            context: CorrelatedContext {
                trace_id: identity.trace_id().clone(),
                span_id: record_key.span_id().clone(),
                sampled: true,
                parent: None,
            },
            attributes: tags,
        };

        debug!(
            span_name,
            trace_id = %request.context.trace_id,
            span_id = %request.context.span_id,
            tags = request.attributes.len(),
            "Opening correlated span"
        );

        self.tracer.open_span(request)
    }
}
