//! Transport implementations
//!
//! Contains LogTransport and NetworkTransport.

mod log;
mod network;

use contracts::{Batch, CoordError, Transport, TransportConfig, TransportKind};
use tracing::instrument;

use crate::error::DispatcherError;

pub use self::log::LogTransport;
pub use self::network::{NetworkFormat, NetworkTransport, NetworkTransportConfig};

/// Transport selected by configuration
pub enum ConfiguredTransport {
    Log(LogTransport),
    Network(NetworkTransport),
}

impl Transport for ConfiguredTransport {
    fn name(&self) -> &str {
        match self {
            Self::Log(t) => t.name(),
            Self::Network(t) => t.name(),
        }
    }

    async fn send(&self, batch: &Batch) -> Result<(), CoordError> {
        match self {
            Self::Log(t) => t.send(batch).await,
            Self::Network(t) => t.send(batch).await,
        }
    }

    async fn close(&mut self) -> Result<(), CoordError> {
        match self {
            Self::Log(t) => t.close().await,
            Self::Network(t) => t.close().await,
        }
    }
}

/// Create a transport from configuration
#[instrument(
    name = "dispatcher_create_transport",
    skip(config),
    fields(transport = %config.name, kind = ?config.kind)
)]
pub async fn create_transport(
    config: &TransportConfig,
) -> Result<ConfiguredTransport, DispatcherError> {
    match config.kind {
        TransportKind::Log => Ok(ConfiguredTransport::Log(LogTransport::new(&config.name))),
        TransportKind::Network => {
            let transport = NetworkTransport::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::transport_creation(&config.name, e.to_string()))?;
            Ok(ConfiguredTransport::Network(transport))
        }
    }
}
