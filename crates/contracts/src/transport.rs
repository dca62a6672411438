//! Transport trait - Dispatcher output interface
//!
//! Defines the abstract interface for transports.

use crate::{Batch, CoordError};

/// Batch delivery trait
///
/// `send` takes `&self` so a retry loop can re-issue it without holding
/// a mutable borrow across attempts.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one batch
    ///
    /// # Errors
    /// Returns send error (should include context)
    async fn send(&self, batch: &Batch) -> Result<(), CoordError>;

    /// Close transport
    async fn close(&mut self) -> Result<(), CoordError>;
}
