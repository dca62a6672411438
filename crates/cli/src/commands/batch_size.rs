//! `batch-size` command implementation.

use anyhow::{Context, Result};
use batch_sizer::{BatchSizer, TcpConnectProbe};
use tracing::info;

use super::load_config;
use crate::cli::BatchSizeArgs;

/// Execute the `batch-size` command
pub async fn run_batch_size(args: &BatchSizeArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    let probe = TcpConnectProbe::from_config(&config.probe);
    let mut sizer = BatchSizer::from_config(probe, &config.probe, &config.sizing);
    if let Some(latency_ms) = args.fallback_latency_ms {
        sizer = sizer.with_fallback_latency(latency_ms);
    }

    info!(
        messages = args.messages,
        message_size = args.message_size,
        "Computing batch size"
    );

    let decision = sizer
        .decide(args.messages, args.message_size)
        .await
        .context("Batch size computation failed")?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&decision).context("Failed to serialize decision")?;
        println!("{}", json);
    } else {
        println!("\n=== Batch Size ===\n");
        println!("  Messages: {}", args.messages);
        println!(
            "  Latency: {:.2} ms{}",
            decision.latency_ms,
            if decision.latency_assumed {
                " (assumed)"
            } else {
                ""
            }
        );
        println!("  Latency ceiling: {}", decision.latency_ceiling);
        println!("  Volume ceiling: {}", decision.volume_ceiling);
        println!(
            "  Batch size: {}{}",
            decision.size,
            if decision.byte_capped {
                " (byte capped)"
            } else {
                ""
            }
        );
        println!("  Batches: {}", args.messages.div_ceil(decision.size));
        println!();
    }

    Ok(())
}
