//! Coordinator - one unit of work through identity, sizing, retry and tracing

use std::sync::Arc;
use std::time::{Duration, Instant};

use batch_sizer::BatchSizer;
use contracts::{
    average_message_size, Batch, BatchSizeDecision, CoordError, Identity, LatencyProbe, Message,
    SchemaValidator, Token, Transport,
};
use resilience::ExecutionPolicy;
use serde_json::{json, Map, Value};
use span_correlator::{CorrelatedSpan, CorrelationTracer, SpanCorrelator};
use tracing::{error, info, instrument, warn, Instrument};

use crate::metrics::DispatchMetrics;
use crate::progress::Progress;

const DEFAULT_SPAN_NAME: &str = "dispatch_batch";

/// One logical request to dispatch
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    pub unit_type: String,
    pub correlation_id: Option<String>,
    pub trace_id: Option<String>,
    pub extra_fields: Option<Map<String, Value>>,
    /// Checked by the schema collaborator, if one is configured
    pub data: Option<Value>,
    pub messages: Vec<Message>,
}

impl UnitOfWork {
    pub fn new(unit_type: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            unit_type: unit_type.into(),
            messages,
            ..Self::default()
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    pub fn with_extra_fields(mut self, fields: Map<String, Value>) -> Self {
        self.extra_fields = Some(fields);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Result of dispatching one batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub sequence: u64,
    pub record_id: Token,
    pub messages: usize,
    /// Transport send attempts, retries included
    pub attempts: u32,
    pub elapsed: Duration,
    /// Last error when the batch was given up on
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of dispatching one unit of work
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub identity: Identity,
    /// `None` when there was nothing to send
    pub decision: Option<BatchSizeDecision>,
    pub batches: Vec<BatchOutcome>,
    pub elapsed: Duration,
}

impl DispatchReport {
    pub fn delivered_messages(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.delivered())
            .map(|b| b.messages)
            .sum()
    }

    pub fn failed_batches(&self) -> usize {
        self.batches.iter().filter(|b| !b.delivered()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_batches() == 0
    }
}

/// Drives units of work through the coordination path:
/// identity → batch size → per batch (record key, span, retried send)
pub struct Coordinator<P, T, X> {
    sizer: BatchSizer<P>,
    correlator: SpanCorrelator<T>,
    transport: X,
    policy: ExecutionPolicy,
    validator: Option<Arc<dyn SchemaValidator>>,
    metrics: Arc<DispatchMetrics>,
    span_name: String,
}

impl<P, T, X> Coordinator<P, T, X>
where
    P: LatencyProbe + Sync,
    T: CorrelationTracer,
    X: Transport + Sync,
{
    pub fn new(
        sizer: BatchSizer<P>,
        correlator: SpanCorrelator<T>,
        transport: X,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            sizer,
            correlator,
            transport,
            policy,
            validator: None,
            metrics: Arc::new(DispatchMetrics::new()),
            span_name: DEFAULT_SPAN_NAME.to_string(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_span_name(mut self, name: impl Into<String>) -> Self {
        self.span_name = name.into();
        self
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &X {
        &self.transport
    }

    pub async fn close(&mut self) -> Result<(), CoordError> {
        self.transport.close().await
    }

    /// Dispatch one unit of work.
    ///
    /// A batch that still fails after the retry policy is recorded in the
    /// report and the next batch continues.
    ///
    /// # Errors
    /// Caller bugs abort the unit: `MissingType`, `Validation`,
    /// `InvalidTraceContext`. `ProbeExhaustion` propagates when no
    /// fallback latency is configured.
    #[instrument(
        name = "coordinator_dispatch",
        skip(self, unit),
        fields(unit_type = %unit.unit_type, messages = unit.messages.len())
    )]
    pub async fn dispatch(&self, unit: UnitOfWork) -> Result<DispatchReport, CoordError> {
        let started = Instant::now();

        let identity = identity::build_identity(
            &unit.unit_type,
            unit.correlation_id.as_deref(),
            unit.trace_id.as_deref(),
            unit.extra_fields,
        )?;

        if let (Some(validator), Some(data)) = (&self.validator, &unit.data) {
            if let Err(e) = validator.validate(identity.unit_type(), data) {
                warn!(unit_type = identity.unit_type(), error = %e, "Payload rejected");
                return Err(e);
            }
        }

        let total = unit.messages.len();
        if total == 0 {
            info!(correlation_id = %identity.correlation_id(), "Nothing to dispatch");
            return Ok(DispatchReport {
                identity,
                decision: None,
                batches: Vec::new(),
                elapsed: started.elapsed(),
            });
        }

        let avg = average_message_size(&unit.messages).unwrap_or(0);
        let decision = self.sizer.decide(total, avg).await?;

        info!(
            correlation_id = %identity.correlation_id(),
            trace_id = %identity.trace_id(),
            batch_size = decision.size,
            latency_ms = decision.latency_ms,
            "Dispatching unit of work"
        );

        let mut batches = Vec::with_capacity(total.div_ceil(decision.size));
        let mut processed = 0;

        for (index, chunk) in unit.messages.chunks(decision.size).enumerate() {
            let batch = Batch {
                identity: identity.clone(),
                record_key: identity::build_record_key(),
                sequence: index as u64,
                messages: chunk.to_vec(),
            };

            let outcome = self.dispatch_batch(&batch).await?;
            processed += outcome.messages;

            let progress = Progress::compute(processed, total, started);
            info!(
                sequence = outcome.sequence,
                delivered = outcome.delivered(),
                progress = %progress,
                "Batch processed"
            );
            batches.push(outcome);
        }

        Ok(DispatchReport {
            identity,
            decision: Some(decision),
            batches,
            elapsed: started.elapsed(),
        })
    }

    async fn dispatch_batch(&self, batch: &Batch) -> Result<BatchOutcome, CoordError> {
        let attributes = json!({
            "headers": batch.identity.headers(),
            "key": { "recordId": batch.record_key.record_id().as_str() },
            "batch": {
                "sequence": batch.sequence,
                "messages": batch.len(),
                "bytes": batch.byte_len(),
            },
        });

        let mut span = self.correlator.start_correlated_span(
            &self.span_name,
            batch.identity.unit_type(),
            &batch.identity,
            &batch.record_key,
            &attributes,
        )?;

        let log_span = span.log_span();
        let started = Instant::now();
        let mut attempts = 0u32;
        let result = self
            .policy
            .run(
                || {
                    attempts += 1;
                    self.transport.send(batch)
                },
                |e: &CoordError| self.policy.should_retry(e),
            )
            .instrument(log_span.clone())
            .await;
        let elapsed = started.elapsed();

        span.record_result(&result);
        observability::record_batch_dispatched(self.transport.name(), result.is_ok());

        let mut outcome = BatchOutcome {
            sequence: batch.sequence,
            record_id: batch.record_key.record_id().clone(),
            messages: batch.len(),
            attempts,
            elapsed,
            error: None,
        };

        match result {
            Ok(()) => {
                self.metrics.record_sent(batch.len(), attempts);
                Ok(outcome)
            }
            Err(e) if is_caller_bug(&e) => Err(e),
            Err(e) => {
                self.metrics.record_failed(attempts);
                log_span.in_scope(|| {
                    error!(
                        transport = %self.transport.name(),
                        sequence = batch.sequence,
                        attempts,
                        error = %e,
                        "Batch dispatch failed"
                    )
                });
                outcome.error = Some(e.to_string());
                Ok(outcome)
            }
        }
    }
}

fn is_caller_bug(err: &CoordError) -> bool {
    matches!(
        err,
        CoordError::MissingType
            | CoordError::Validation { .. }
            | CoordError::InvalidTraceContext { .. }
    )
}
