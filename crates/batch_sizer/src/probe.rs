//! Latency Probe - concurrent fan-out to reference endpoints

use std::time::{Duration, Instant};

use contracts::{CoordError, LatencyProbe, LatencySample, ProbeConfig};
use futures::future::join_all;
use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

/// Probe measuring TCP connect time (name resolution included)
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    default_port: u16,
    timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(default_port: u16, timeout: Duration) -> Self {
        Self {
            default_port,
            timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.port, Duration::from_millis(config.timeout_ms))
    }
}

impl Default for TcpConnectProbe {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl LatencyProbe for TcpConnectProbe {
    async fn probe(&self, endpoint: &str) -> Result<Duration, CoordError> {
        let (host, port) = split_endpoint(endpoint, self.default_port);
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(started.elapsed()),
            Ok(Err(e)) => Err(CoordError::probe(endpoint, e.to_string())),
            Err(_) => Err(CoordError::probe(
                endpoint,
                format!("no connection within {}ms", self.timeout.as_millis()),
            )),
        }
    }
}

/// Split `host:port`, falling back to `default_port` when no port is given.
///
/// IPv6 literals take a port only in brackets (`[::1]:443`); the brackets
/// are stripped. Bare IPv6 literals (more than one `:`) are returned
/// unchanged.
pub fn split_endpoint(endpoint: &str, default_port: u16) -> (&str, u16) {
    if let Some(rest) = endpoint.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = match tail.strip_prefix(':') {
                Some(port) => port.parse().unwrap_or(default_port),
                None => default_port,
            };
            return (host, port);
        }
    }

    match endpoint.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (endpoint, default_port),
        },
        _ => (endpoint, default_port),
    }
}

/// Probe every endpoint once, concurrently, keeping endpoint order.
///
/// Failed probes become `None`; no probe is retried.
#[instrument(name = "latency_sample", skip(probe, endpoints), fields(endpoint_count = endpoints.len()))]
pub async fn sample_latency<P>(probe: &P, endpoints: &[String]) -> LatencySample
where
    P: LatencyProbe + Sync,
{
    let results = join_all(endpoints.iter().map(|endpoint| probe.probe(endpoint))).await;

    let rtts_ms = results
        .into_iter()
        .zip(endpoints)
        .map(|(result, endpoint)| match result {
            Ok(rtt) => {
                let ms = rtt.as_secs_f64() * 1000.0;
                observability::record_probe_latency_ms(endpoint, ms);
                debug!(endpoint = %endpoint, rtt_ms = ms, "Probe succeeded");
                Some(ms)
            }
            Err(e) => {
                observability::record_probe_failure(endpoint);
                warn!(endpoint = %endpoint, error = %e, "Probe failed");
                None
            }
        })
        .collect();

    LatencySample {
        endpoints: endpoints.to_vec(),
        rtts_ms,
    }
}

/// Best (minimum) latency over one fan-out round.
///
/// # Errors
/// `CoordError::ProbeExhaustion` when every probe failed or no endpoint
/// was given.
pub async fn best_latency<P>(probe: &P, endpoints: &[String]) -> Result<f64, CoordError>
where
    P: LatencyProbe + Sync,
{
    let sample = sample_latency(probe, endpoints).await;
    sample.best().ok_or_else(|| CoordError::ProbeExhaustion {
        attempted: sample.endpoints.len(),
        failures: sample.endpoints.clone(),
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Probe answering from a fixed table, optionally after a delay
    pub struct ScriptedProbe {
        pub answers: HashMap<String, Option<f64>>,
        pub delay: Duration,
    }

    impl ScriptedProbe {
        pub fn new(answers: &[(&str, Option<f64>)]) -> Self {
            Self {
                answers: answers
                    .iter()
                    .map(|(endpoint, rtt)| (endpoint.to_string(), *rtt))
                    .collect(),
                delay: Duration::ZERO,
            }
        }

        pub fn uniform(latency_ms: f64) -> Self {
            Self::new(&[("ref", Some(latency_ms))])
        }
    }

    impl LatencyProbe for ScriptedProbe {
        async fn probe(&self, endpoint: &str) -> Result<Duration, CoordError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.answers.get(endpoint).copied().flatten() {
                Some(ms) => Ok(Duration::from_secs_f64(ms / 1000.0)),
                None => Err(CoordError::probe(endpoint, "unreachable")),
            }
        }
    }
}
