//! `probe` command implementation.

use anyhow::{Context, Result};
use batch_sizer::{sample_latency, TcpConnectProbe};
use tracing::info;

use super::load_config;
use crate::cli::ProbeArgs;

/// Execute the `probe` command
pub async fn run_probe(args: &ProbeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let endpoints = if args.endpoints.is_empty() {
        config.probe.endpoints.clone()
    } else {
        args.endpoints.clone()
    };

    info!(endpoints = endpoints.len(), "Probing reference endpoints");

    let probe = TcpConnectProbe::from_config(&config.probe);
    let sample = sample_latency(&probe, &endpoints).await;

    if args.json {
        let json = serde_json::to_string_pretty(&sample).context("Failed to serialize sample")?;
        println!("{}", json);
    } else {
        println!("\n=== Latency Probe ===\n");
        for (endpoint, rtt) in sample.endpoints.iter().zip(&sample.rtts_ms) {
            match rtt {
                Some(ms) => println!("  ✓ {:<32} {:>8.2} ms", endpoint, ms),
                None => println!("  ✗ {:<32} {:>8}", endpoint, "failed"),
            }
        }
        match sample.best() {
            Some(best) => println!("\n  Best: {:.2} ms", best),
            None => println!("\n  Best: n/a (all probes failed)"),
        }
        println!();
    }

    if sample.best().is_none() {
        anyhow::bail!("All {} latency probes failed", sample.endpoints.len());
    }
    Ok(())
}
