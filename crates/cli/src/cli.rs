//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use observability::Severity;
use std::path::PathBuf;

/// Dispatch Coord - resilience and dispatch coordination for message producers
#[derive(Parser, Debug)]
#[command(
    name = "dispatch-coord",
    author,
    version,
    about = "Resilience and dispatch coordination for message producers",
    long_about = "Builds correlation identities, sizes batches from live network latency,\n\
                  dispatches them with bounded retries and a hard deadline, and opens a\n\
                  trace span per batch keyed by the same identity."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "DISPATCH_COORD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Default log severity (emerg, alert, crit, error, warning, notice, info, debug)
    #[arg(long, global = true, env = "DISPATCH_COORD_LOG_LEVEL")]
    pub log_level: Option<Severity>,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "DISPATCH_COORD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Severity used when `RUST_LOG` is not set
    pub fn severity(&self) -> Severity {
        if let Some(level) = self.log_level {
            return level;
        }
        if self.quiet {
            return Severity::Warning;
        }
        match self.verbose {
            0 => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file
    Validate(ValidateArgs),

    /// Measure latency to the reference endpoints
    Probe(ProbeArgs),

    /// Compute a batch size from live latency
    BatchSize(BatchSizeArgs),

    /// Build a correlation identity and record key
    Identity(IdentityArgs),

    /// Dispatch a synthetic unit of work through the full coordination path
    Run(RunArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dispatch-coord.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `probe` command
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long, env = "DISPATCH_COORD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Endpoint to probe (host or host:port), repeatable; overrides configuration
    #[arg(short, long = "endpoint")]
    pub endpoints: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `batch-size` command
#[derive(Parser, Debug)]
pub struct BatchSizeArgs {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long, env = "DISPATCH_COORD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Total number of messages in the unit of work
    #[arg(short, long)]
    pub messages: usize,

    /// Average message size in bytes (0 = configured default)
    #[arg(long, default_value = "1024")]
    pub message_size: usize,

    /// Latency to assume when every probe fails
    #[arg(long)]
    pub fallback_latency_ms: Option<f64>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `identity` command
#[derive(Parser, Debug)]
pub struct IdentityArgs {
    /// Unit-of-work type
    #[arg(short = 't', long = "type")]
    pub unit_type: String,

    /// Explicit correlation id
    #[arg(long)]
    pub correlation_id: Option<String>,

    /// Explicit trace id
    #[arg(long)]
    pub trace_id: Option<String>,

    /// Extra header field as key=value, repeatable
    #[arg(short, long = "field", value_parser = parse_key_value)]
    pub fields: Vec<(String, String)>,
}

/// Service metadata overrides attached to correlated spans
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceArgs {
    /// Message system name
    #[arg(long, env = "MESSAGE_SYSTEM")]
    pub message_system: Option<String>,

    /// Consumer / producer group id
    #[arg(long, env = "GROUP_ID")]
    pub group_id: Option<String>,

    /// Client id
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: Option<String>,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "dispatch-coord.toml",
        env = "DISPATCH_COORD_CONFIG"
    )]
    pub config: PathBuf,

    /// Number of synthetic messages
    #[arg(short, long, default_value = "100")]
    pub messages: usize,

    /// Payload size of each synthetic message in bytes
    #[arg(long, default_value = "1024")]
    pub payload_size: usize,

    /// Unit-of-work type
    #[arg(short = 't', long = "type", default_value = "synthetic")]
    pub unit_type: String,

    /// Explicit correlation id
    #[arg(long)]
    pub correlation_id: Option<String>,

    /// Explicit trace id
    #[arg(long)]
    pub trace_id: Option<String>,

    #[command(flatten)]
    pub service: ServiceArgs,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "DISPATCH_COORD_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "dispatch-coord",
            "-v",
            "run",
            "--config",
            "coord.toml",
            "--messages",
            "500",
            "--type",
            "order.created",
            "--group-id",
            "orders",
        ])
        .unwrap();

        assert_eq!(cli.severity(), Severity::Debug);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.messages, 500);
                assert_eq!(args.payload_size, 1024);
                assert_eq!(args.unit_type, "order.created");
                assert_eq!(args.service.group_id.as_deref(), Some("orders"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_level_overrides_verbosity() {
        let cli = Cli::try_parse_from([
            "dispatch-coord",
            "--log-level",
            "notice",
            "identity",
            "--type",
            "t",
        ])
        .unwrap();
        assert_eq!(cli.severity(), Severity::Notice);
    }

    #[test]
    fn test_identity_fields() {
        let cli = Cli::try_parse_from([
            "dispatch-coord",
            "identity",
            "-t",
            "order.created",
            "-f",
            "tenant=acme",
            "-f",
            "region=eu",
        ])
        .unwrap();

        match cli.command {
            Commands::Identity(args) => {
                assert_eq!(
                    args.fields,
                    vec![
                        ("tenant".to_string(), "acme".to_string()),
                        ("region".to_string(), "eu".to_string())
                    ]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_bad_field_rejected() {
        let result =
            Cli::try_parse_from(["dispatch-coord", "identity", "-t", "x", "-f", "novalue"]);
        assert!(result.is_err());
    }
}
