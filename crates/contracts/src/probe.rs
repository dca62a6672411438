//! LatencyProbe trait - Latency Probe input interface

use std::time::Duration;

use crate::CoordError;

/// Single-endpoint round-trip measurement.
///
/// One call measures one endpoint once; fan-out and reduction belong to
/// the caller.
#[trait_variant::make(LatencyProbe: Send)]
pub trait LocalLatencyProbe {
    /// Measure the round-trip time to `endpoint`
    ///
    /// # Errors
    /// Returns a probe error when the endpoint cannot be reached in time
    async fn probe(&self, endpoint: &str) -> Result<Duration, CoordError>;
}
