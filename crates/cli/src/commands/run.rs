//! `run` command implementation.

use anyhow::{Context, Result};
use batch_sizer::{BatchSizer, TcpConnectProbe};
use contracts::{CoordinatorConfig, Message, ServiceConfig, TracerKind, Transport};
use dispatcher::{create_transport, Coordinator, DispatchReport, UnitOfWork};
use observability::DispatchStatsAggregator;
use resilience::ExecutionPolicy;
use span_correlator::{CorrelationTracer, NoopTracer, SpanCorrelator, TracingTracer};
use tracing::{info, warn};

use crate::cli::{RunArgs, ServiceArgs};

/// Execute the `run` command
pub async fn run_dispatch(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_service_overrides(&mut config.service, &args.service);

    info!(
        service = %config.service.name,
        endpoints = config.probe.endpoints.len(),
        tracer = ?config.telemetry.tracer,
        transport = %config.transport.name,
        "Configuration loaded"
    );

    let report = match config.telemetry.tracer {
        TracerKind::Noop => execute(&config, args, NoopTracer).await?,
        TracerKind::Tracing => execute(&config, args, TracingTracer).await?,
        TracerKind::Otel => execute_otel(&config, args).await?,
    };

    print_report(&report);

    if !report.is_complete() {
        anyhow::bail!(
            "{} of {} batches were not delivered",
            report.failed_batches(),
            report.batches.len()
        );
    }

    info!("Dispatch finished");
    Ok(())
}

#[cfg(feature = "otel")]
async fn execute_otel(config: &CoordinatorConfig, args: &RunArgs) -> Result<DispatchReport> {
    use span_correlator::{telemetry, OtelTracer};

    let provider = telemetry::init_provider(&config.service.name, &config.telemetry.exporters)
        .context("Failed to initialize tracer provider")?;
    let tracer = OtelTracer::from_provider(&provider, config.service.name.clone());

    let report = execute(config, args, tracer).await;
    telemetry::shutdown_provider(provider);
    report
}

#[cfg(not(feature = "otel"))]
async fn execute_otel(_config: &CoordinatorConfig, _args: &RunArgs) -> Result<DispatchReport> {
    anyhow::bail!("telemetry.tracer = \"otel\" requires building with the `otel` feature")
}

/// Wire the coordinator for `tracer` and dispatch one synthetic unit
async fn execute<T>(config: &CoordinatorConfig, args: &RunArgs, tracer: T) -> Result<DispatchReport>
where
    T: CorrelationTracer,
{
    let probe = TcpConnectProbe::from_config(&config.probe);
    let sizer = BatchSizer::from_config(probe, &config.probe, &config.sizing);
    let correlator = SpanCorrelator::new(tracer, config.service.clone());
    let transport = create_transport(&config.transport)
        .await
        .context("Failed to create transport")?;
    let policy = ExecutionPolicy::from_config(&config.resilience);

    let mut coordinator = Coordinator::new(sizer, correlator, transport, policy);
    let unit = synthetic_unit(args);

    info!(
        unit_type = %unit.unit_type,
        messages = unit.messages.len(),
        transport = %coordinator.transport().name(),
        "Starting dispatch..."
    );

    let result = tokio::select! {
        result = coordinator.dispatch(unit) => Some(result),
        _ = shutdown_signal() => None,
    };

    if let Err(e) = coordinator.close().await {
        warn!(error = %e, "Error closing transport");
    }

    match result {
        Some(report) => {
            let snapshot = coordinator.metrics().snapshot();
            info!(
                batches_sent = snapshot.batches_sent,
                batch_failures = snapshot.batch_failures,
                attempts = snapshot.attempts,
                messages_delivered = snapshot.messages_delivered,
                "Coordinator metrics"
            );
            report.context("Dispatch failed")
        }
        None => {
            warn!("Received shutdown signal, dispatch interrupted");
            anyhow::bail!("Dispatch interrupted")
        }
    }
}

fn apply_service_overrides(service: &mut ServiceConfig, overrides: &ServiceArgs) {
    if let Some(ref system) = overrides.message_system {
        info!(message_system = %system, "Overriding message system from CLI");
        service.message_system = Some(system.clone());
    }
    if let Some(ref group) = overrides.group_id {
        info!(group_id = %group, "Overriding group id from CLI");
        service.group_id = Some(group.clone());
    }
    if let Some(ref client) = overrides.client_id {
        info!(client_id = %client, "Overriding client id from CLI");
        service.client_id = Some(client.clone());
    }
}

fn synthetic_unit(args: &RunArgs) -> UnitOfWork {
    let messages = (0..args.messages)
        .map(|i| Message::new(vec![b'x'; args.payload_size]).with_key(format!("msg-{i}")))
        .collect();

    let mut unit = UnitOfWork::new(args.unit_type.clone(), messages);
    if let Some(ref id) = args.correlation_id {
        unit = unit.with_correlation_id(id.clone());
    }
    if let Some(ref id) = args.trace_id {
        unit = unit.with_trace_id(id.clone());
    }
    unit
}

/// Resolves on Ctrl+C or SIGTERM; a handler that cannot be installed
/// never resolves
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn print_report(report: &DispatchReport) {
    let mut stats = DispatchStatsAggregator::new();
    for batch in &report.batches {
        stats.record_batch(
            batch.messages,
            batch.attempts,
            batch.delivered(),
            batch.elapsed.as_secs_f64() * 1000.0,
        );
    }

    println!("\n=== Dispatch Report ===\n");
    println!("  Correlation id: {}", report.identity.correlation_id());
    println!("  Trace id: {}", report.identity.trace_id());
    println!("  Type: {}", report.identity.unit_type());
    match report.decision {
        Some(decision) => println!(
            "  Batch size: {} (latency {:.2} ms{})",
            decision.size,
            decision.latency_ms,
            if decision.latency_assumed {
                ", assumed"
            } else {
                ""
            }
        ),
        None => println!("  Batch size: n/a (nothing to send)"),
    }
    println!("  Elapsed: {:.2?}", report.elapsed);

    for batch in report.batches.iter().filter(|b| !b.delivered()) {
        println!(
            "  ✗ batch {} ({}): {}",
            batch.sequence,
            batch.record_id,
            batch.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("\n{}", stats.summary());
}
