//! Tracer provider bootstrap (`otel` feature)
//!
//! The provider is built explicitly and handed to [`crate::OtelTracer`];
//! nothing is registered globally.

use contracts::{CoordError, ExporterConfig};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use tracing::{info, warn};

/// Build a provider with one batched OTLP (gRPC) exporter per configured
/// exporter.
///
/// The provider must be kept alive for as long as spans are produced;
/// see [`shutdown_provider`].
///
/// # Errors
/// `CoordError::ConfigValidation` if an exporter cannot be built.
pub fn init_provider(
    service_name: &str,
    exporters: &[ExporterConfig],
) -> Result<SdkTracerProvider, CoordError> {
    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();
    let mut builder = SdkTracerProvider::builder().with_resource(resource);

    if exporters.is_empty() {
        warn!("No trace exporters configured, spans will not be exported");
    }

    for exporter_config in exporters {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(exporter_config.endpoint.clone())
            .build()
            .map_err(|e| {
                CoordError::config_validation(
                    format!("telemetry.exporters.{}", exporter_config.name),
                    e.to_string(),
                )
            })?;
        builder = builder.with_batch_exporter(exporter);

        info!(
            exporter = %exporter_config.name,
            endpoint = %exporter_config.endpoint,
            "Trace exporter configured"
        );
    }

    Ok(builder.build())
}

/// Flush pending spans and shut the exporters down
pub fn shutdown_provider(provider: SdkTracerProvider) {
    if let Err(e) = provider.shutdown() {
        warn!(error = %e, "Error shutting down tracer provider");
    }
}
