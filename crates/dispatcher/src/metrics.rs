//! In-process dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one coordinator (shared across units of work)
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Batches delivered
    batches_sent: AtomicU64,
    /// Batches that failed after all attempts
    batch_failures: AtomicU64,
    /// Transport send attempts, retries included
    attempts: AtomicU64,
    /// Messages in delivered batches
    messages_delivered: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    pub fn batch_failures(&self) -> u64 {
        self.batch_failures.load(Ordering::Relaxed)
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn messages_delivered(&self) -> u64 {
        self.messages_delivered.load(Ordering::Relaxed)
    }

    /// Record a delivered batch
    pub fn record_sent(&self, messages: usize, attempts: u32) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.messages_delivered
            .fetch_add(messages as u64, Ordering::Relaxed);
        self.attempts.fetch_add(u64::from(attempts), Ordering::Relaxed);
    }

    /// Record a batch that was given up on
    pub fn record_failed(&self, attempts: u32) {
        self.batch_failures.fetch_add(1, Ordering::Relaxed);
        self.attempts.fetch_add(u64::from(attempts), Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_sent: self.batches_sent(),
            batch_failures: self.batch_failures(),
            attempts: self.attempts(),
            messages_delivered: self.messages_delivered(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub batches_sent: u64,
    pub batch_failures: u64,
    pub attempts: u64,
    pub messages_delivered: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_accumulates() {
        let metrics = DispatchMetrics::new();
        metrics.record_sent(10, 1);
        metrics.record_sent(5, 3);
        metrics.record_failed(3);

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                batches_sent: 2,
                batch_failures: 1,
                attempts: 7,
                messages_delivered: 15,
            }
        );
    }
}
