//! NetworkTransport - one UDP datagram per batch

use std::collections::HashMap;
use std::net::SocketAddr;

use chrono::{SecondsFormat, Utc};
use contracts::{Batch, CoordError, Message, Transport};
use serde::Serialize;
use serde_json::Value;
use tokio::net::UdpSocket;
use tracing::{debug, instrument, warn};

/// Serialization format for network transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkFormat {
    /// JSON (human-readable, larger)
    #[default]
    Json,
    /// Bincode (binary, compact)
    Bincode,
}

/// Configuration for NetworkTransport
#[derive(Debug, Clone)]
pub struct NetworkTransportConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Serialization format
    pub format: NetworkFormat,
    /// Max datagram size (UDP typically 65507 for IPv4)
    pub max_packet_size: usize,
}

impl NetworkTransportConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{}': {}", addr_str, e))?;

        let format = match params.get("format").map(String::as_str) {
            Some("bincode") => NetworkFormat::Bincode,
            Some("json") | None => NetworkFormat::Json,
            Some(other) => return Err(format!("unknown format '{}'", other)),
        };

        let max_packet_size = match params.get("max_packet_size") {
            Some(s) => s
                .parse()
                .map_err(|e| format!("invalid max_packet_size '{}': {}", s, e))?,
            None => 65000,
        };

        Ok(Self {
            addr,
            format,
            max_packet_size,
        })
    }
}

/// Envelope sent on the wire
#[derive(Debug, Serialize)]
struct WireBatch<'a> {
    headers: Value,
    key: WireKey<'a>,
    sequence: u64,
    timestamp: String,
    messages: &'a [Message],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireKey<'a> {
    record_id: &'a str,
}

impl<'a> WireBatch<'a> {
    fn new(batch: &'a Batch) -> Self {
        Self {
            headers: batch.identity.headers(),
            key: WireKey {
                record_id: batch.record_key.record_id().as_str(),
            },
            sequence: batch.sequence,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            messages: &batch.messages,
        }
    }
}

/// Transport that sends each batch as a UDP datagram
pub struct NetworkTransport {
    name: String,
    config: NetworkTransportConfig,
    socket: Option<UdpSocket>,
}

impl NetworkTransport {
    /// Create a new NetworkTransport
    #[instrument(name = "network_transport_new", skip(name, config))]
    pub async fn new(
        name: impl Into<String>,
        config: NetworkTransportConfig,
    ) -> std::io::Result<Self> {
        let name = name.into();
        let bind_addr = if config.addr.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(&config.addr).await?;

        debug!(
            transport = %name,
            target = %config.addr,
            "NetworkTransport connected"
        );

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    /// Create from params (for factory)
    #[instrument(name = "network_transport_from_params", skip(name, params))]
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, CoordError> {
        let name = name.into();
        let config = NetworkTransportConfig::from_params(params)
            .map_err(|e| CoordError::config_validation("transport.params", e))?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| CoordError::TransportConnection {
                transport: name,
                message: e.to_string(),
            })
    }

    fn serialize_batch(&self, batch: &Batch) -> Result<Vec<u8>, String> {
        let wire = WireBatch::new(batch);
        match self.config.format {
            NetworkFormat::Json => {
                serde_json::to_vec(&wire).map_err(|e| format!("json error: {}", e))
            }
            NetworkFormat::Bincode => {
                bincode::serialize(&wire).map_err(|e| format!("bincode error: {}", e))
            }
        }
    }

    fn socket(&self) -> Result<&UdpSocket, CoordError> {
        self.socket
            .as_ref()
            .ok_or_else(|| CoordError::transport(&self.name, "socket not connected"))
    }

    fn prepare_payload(&self, batch: &Batch) -> Result<Vec<u8>, CoordError> {
        let data = self
            .serialize_batch(batch)
            .map_err(|e| CoordError::Other(format!("transport '{}': {}", self.name, e)))?;

        // Resending cannot make an oversized datagram fit
        if data.len() > self.config.max_packet_size {
            warn!(
                transport = %self.name,
                size = data.len(),
                max = self.config.max_packet_size,
                "Batch too large for one datagram"
            );
            return Err(CoordError::Other(format!(
                "transport '{}': batch of {} bytes exceeds max packet size {}",
                self.name,
                data.len(),
                self.config.max_packet_size
            )));
        }

        Ok(data)
    }
}

impl Transport for NetworkTransport {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_transport_send",
        skip(self, batch),
        fields(transport = %self.name, sequence = batch.sequence)
    )]
    async fn send(&self, batch: &Batch) -> Result<(), CoordError> {
        let socket = self.socket()?;
        let data = self.prepare_payload(batch)?;

        let sent = socket
            .send(&data)
            .await
            .map_err(|e| CoordError::transport(&self.name, e.to_string()))?;

        debug!(transport = %self.name, sequence = batch.sequence, bytes = sent, "Sent");
        Ok(())
    }

    #[instrument(name = "network_transport_close", skip(self))]
    async fn close(&mut self) -> Result<(), CoordError> {
        self.socket = None;
        debug!(transport = %self.name, "NetworkTransport closed");
        Ok(())
    }
}
