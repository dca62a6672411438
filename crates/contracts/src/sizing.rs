//! LatencySample / BatchSizeDecision - Batch Sizer inputs and outputs

use serde::Serialize;

/// Round-trip times of one probe fan-out, in endpoint order.
///
/// Ephemeral: lives for a single sizing decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySample {
    /// Probed endpoints
    pub endpoints: Vec<String>,

    /// Round-trip time per endpoint in milliseconds (`None` = probe failed)
    pub rtts_ms: Vec<Option<f64>>,
}

impl LatencySample {
    /// Minimum successful round-trip time
    pub fn best(&self) -> Option<f64> {
        self.rtts_ms
            .iter()
            .flatten()
            .copied()
            .fold(None, |best, rtt| match best {
                Some(b) if b <= rtt => Some(b),
                _ => Some(rtt),
            })
    }

    /// Number of probes that failed
    pub fn failures(&self) -> usize {
        self.rtts_ms.iter().filter(|rtt| rtt.is_none()).count()
    }
}

/// Result of one batch sizing invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchSizeDecision {
    /// Messages per dispatch, always >= 1
    pub size: usize,

    /// Latency the decision was based on (measured or fallback)
    pub latency_ms: f64,

    /// Whether `latency_ms` is the configured fallback assumption
    pub latency_assumed: bool,

    /// Ceiling from the latency tier
    pub latency_ceiling: usize,

    /// Ceiling from the byte-volume tier (overrides the latency tier)
    pub volume_ceiling: usize,

    /// Whether the hard byte cap shrank the batch
    pub byte_capped: bool,
}
