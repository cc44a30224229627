//! Weather Monitor - live station table from MQTT telemetry
//!
//! # Usage
//!
//! ```bash
//! # Connect to the default broker (ws://localhost:9001)
//! cargo run --release
//!
//! # Explicit broker, JSON output for piping
//! ./weather-monitor --broker-url ws://broker:9001 --output json | jq .
//! ```
//!
//! # Environment Variables
//!
//! - `BROKER_URL`: broker URL (same as `--broker-url`)
//! - `WEATHER_MONITOR_CONFIG`: path to a TOML config file
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use weather_monitor::acquisition::{MqttDialer, TransportAdapter, TransportStats};
use weather_monitor::config::{MonitorConfig, OutputFormat};
use weather_monitor::pipeline::{IngestStats, Ingestor};
use weather_monitor::presenter::{JsonPresenter, Presenter, TerminalPresenter};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "weather-monitor")]
#[command(about = "Live plausibility-checked table of weather station telemetry")]
#[command(version)]
struct CliArgs {
    /// Path to a TOML config file (skips the default search order)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Broker URL, e.g. ws://localhost:9001 or mqtt://mosquitto:1883
    #[arg(long, env = "BROKER_URL", value_name = "URL")]
    broker_url: Option<String>,

    /// Override the telemetry topic
    #[arg(long)]
    topic: Option<String>,

    /// Output format for the station table
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,
}

/// Resolve the effective configuration: file (or search order), then CLI overrides.
fn resolve_config(args: &CliArgs) -> Result<MonitorConfig> {
    let mut config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MonitorConfig::load(),
    };

    if let Some(url) = &args.broker_url {
        config.broker.url = url.clone();
    }
    if let Some(topic) = &args.topic {
        config.broker.topic = topic.clone();
    }
    if let Some(output) = args.output {
        config.display.output = output;
    }

    config.validate()?;
    Ok(config)
}

fn build_presenter(config: &MonitorConfig) -> Box<dyn Presenter> {
    match config.display.output {
        OutputFormat::Table => Box::new(TerminalPresenter::stdout(config.display.clear_screen)),
        OutputFormat::Json => Box::new(JsonPresenter::stdout()),
    }
}

fn log_final_stats(transport: &TransportStats, ingest: &IngestStats) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("📊 FINAL STATISTICS");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("   Messages Received:   {}", transport.messages_received);
    info!("   Messages Processed:  {}", ingest.messages_processed);
    info!("   Malformed Dropped:   {}", ingest.malformed_dropped);
    info!("   Flagged Readings:    {}", ingest.flagged_readings);
    info!("   Stations Tracked:    {}", ingest.stations_tracked);
    info!("   Broker Connections:  {}", transport.connections);
    info!("   Reconnect Attempts:  {}", transport.reconnect_attempts);
    info!("   Subscribe Failures:  {}", transport.subscribe_failures);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the station table.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = resolve_config(&args)?;

    info!(
        broker = %config.broker.url,
        topic = %config.broker.topic,
        reconnect_ms = config.broker.reconnect_interval_ms,
        "Weather monitor starting"
    );

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let dialer = MqttDialer::new(config.broker.client_id.clone())
        .with_keep_alive(config.broker.keep_alive());
    let mut adapter = TransportAdapter::new(dialer);
    adapter.connect(&config.broker.url, config.broker.reconnect_interval())?;

    let (tx, rx) = mpsc::channel(config.broker.channel_capacity);
    let ingestor = Ingestor::new(build_presenter(&config));

    let ingest_handle = tokio::spawn(ingestor.run(rx));
    let transport_stats = adapter
        .run(config.broker.topic.clone(), tx, cancel_token)
        .await?;

    let ingest_stats = match ingest_handle.await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Ingestion task failed");
            IngestStats::default()
        }
    };

    log_final_stats(&transport_stats, &ingest_stats);
    info!("✓ Weather monitor shutdown complete");
    Ok(())
}
