//! Batch Sizer - latency tier, volume tier, byte cap

use contracts::{BatchSizeDecision, CoordError, LatencyProbe, ProbeConfig, SizingConfig};
use tracing::{debug, instrument, warn};

use crate::probe::best_latency;

/// Batch ceiling for high latency / small volume
pub const SMALL_BATCH: usize = 10;
/// Batch ceiling for medium latency / medium volume
pub const MEDIUM_BATCH: usize = 50;
/// Batch ceiling for low latency / large volume
pub const LARGE_BATCH: usize = 100;

/// Hard ceiling on the bytes of a single batch (10MB)
pub const MAX_BATCH_BYTES: usize = 10 * 1024 * 1024;

const HIGH_LATENCY_MS: f64 = 200.0;
const MEDIUM_LATENCY_MS: f64 = 100.0;
const SMALL_VOLUME_BYTES: usize = 100 * 1024;
const MEDIUM_VOLUME_BYTES: usize = 1024 * 1024;

/// Ceiling from the measured latency: `> 200ms → 10`, `> 100ms → 50`, else `100`
pub fn latency_tier(latency_ms: f64) -> usize {
    if latency_ms > HIGH_LATENCY_MS {
        SMALL_BATCH
    } else if latency_ms > MEDIUM_LATENCY_MS {
        MEDIUM_BATCH
    } else {
        LARGE_BATCH
    }
}

/// Ceiling from the estimated byte volume: `< 100KB → 10`, `< 1MB → 50`, else `100`
pub fn volume_tier(total_bytes: usize) -> usize {
    if total_bytes < SMALL_VOLUME_BYTES {
        SMALL_BATCH
    } else if total_bytes < MEDIUM_VOLUME_BYTES {
        MEDIUM_BATCH
    } else {
        LARGE_BATCH
    }
}

/// Size a batch for an already known latency.
///
/// `total_messages = 0` is treated as 1 and `avg_message_size` must be
/// non-zero (callers substitute their default first).
pub fn size_for_latency(
    latency_ms: f64,
    total_messages: usize,
    avg_message_size: usize,
) -> BatchSizeDecision {
    let total = total_messages.max(1);
    let avg = avg_message_size.max(1);

    let latency_ceiling = latency_tier(latency_ms).min(total);
    let volume_ceiling = volume_tier(total.saturating_mul(avg)).min(total);

    // The volume tier replaces the latency tier outright; latency only
    // shows in the result when both tiers agree.
    let mut size = volume_ceiling;

    let byte_capped = size.saturating_mul(avg) > MAX_BATCH_BYTES;
    if byte_capped {
        size = (MAX_BATCH_BYTES / avg).max(1);
    }

    BatchSizeDecision {
        size,
        latency_ms,
        latency_assumed: false,
        latency_ceiling,
        volume_ceiling,
        byte_capped,
    }
}

/// Network-aware batch sizer
pub struct BatchSizer<P> {
    probe: P,
    endpoints: Vec<String>,
    default_message_size: usize,
    fallback_latency_ms: Option<f64>,
}

impl<P> BatchSizer<P>
where
    P: LatencyProbe + Sync,
{
    /// Sizer probing `endpoints`; probe exhaustion propagates
    pub fn new(probe: P, endpoints: Vec<String>) -> Self {
        Self {
            probe,
            endpoints,
            default_message_size: SizingConfig::default().default_message_size,
            fallback_latency_ms: None,
        }
    }

    pub fn from_config(probe: P, probe_config: &ProbeConfig, sizing: &SizingConfig) -> Self {
        Self {
            probe,
            endpoints: probe_config.endpoints.clone(),
            default_message_size: sizing.default_message_size.max(1),
            fallback_latency_ms: sizing.fallback_latency_ms,
        }
    }

    /// Latency to assume when every probe fails
    pub fn with_fallback_latency(mut self, latency_ms: f64) -> Self {
        self.fallback_latency_ms = Some(latency_ms);
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Probe the network and size the next batch.
    ///
    /// # Errors
    /// `CoordError::ProbeExhaustion` when all probes fail and no fallback
    /// latency is configured.
    #[instrument(name = "batch_sizer_decide", skip(self))]
    pub async fn decide(
        &self,
        total_messages: usize,
        avg_message_size: usize,
    ) -> Result<BatchSizeDecision, CoordError> {
        let avg = if avg_message_size == 0 {
            self.default_message_size
        } else {
            avg_message_size
        };

        let (latency_ms, latency_assumed) =
            match best_latency(&self.probe, &self.endpoints).await {
                Ok(latency) => (latency, false),
                Err(e @ CoordError::ProbeExhaustion { .. }) => match self.fallback_latency_ms {
                    Some(fallback) => {
                        warn!(
                            error = %e,
                            fallback_ms = fallback,
                            "All latency probes failed, assuming fallback latency"
                        );
                        (fallback, true)
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            };

        let mut decision = size_for_latency(latency_ms, total_messages, avg);
        decision.latency_assumed = latency_assumed;

        observability::record_batch_size(decision.size, latency_ms);
        debug!(
            size = decision.size,
            latency_ms,
            latency_ceiling = decision.latency_ceiling,
            volume_ceiling = decision.volume_ceiling,
            byte_capped = decision.byte_capped,
            "Batch size decided"
        );

        Ok(decision)
    }

    /// Probe the network and return only the batch size
    pub async fn compute_batch_size(
        &self,
        total_messages: usize,
        avg_message_size: usize,
    ) -> Result<usize, CoordError> {
        Ok(self.decide(total_messages, avg_message_size).await?.size)
    }
}
