//! LogTransport - logs batch summary via tracing

use contracts::{Batch, CoordError, Transport};
use tracing::{info, instrument};

/// Transport that logs batch summaries instead of sending them
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    /// Create a new LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_batch_summary(&self, batch: &Batch) {
        info!(
            transport = %self.name,
            correlation_id = %batch.identity.correlation_id(),
            record_id = %batch.record_key.record_id(),
            unit_type = batch.identity.unit_type(),
            sequence = batch.sequence,
            messages = batch.len(),
            bytes = batch.byte_len(),
            "Batch dispatched"
        );
    }
}

impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, batch),
        fields(transport = %self.name, sequence = batch.sequence)
    )]
    async fn send(&self, batch: &Batch) -> Result<(), CoordError> {
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_transport_close", skip(self))]
    async fn close(&mut self) -> Result<(), CoordError> {
        info!(transport = %self.name, "LogTransport closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Message;

    #[tokio::test]
    async fn test_log_transport_send() {
        let transport = LogTransport::new("test_log");
        let batch = Batch {
            identity: identity::build_identity("order.created", None, None, None).unwrap(),
            record_key: identity::build_record_key(),
            sequence: 0,
            messages: vec![Message::new("hello")],
        };

        assert!(transport.send(&batch).await.is_ok());
    }

    #[tokio::test]
    async fn test_log_transport_name() {
        let transport = LogTransport::new("my_logger");
        assert_eq!(transport.name(), "my_logger");
    }
}
