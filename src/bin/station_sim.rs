//! Weather Station Simulation
//!
//! Publishes synthetic readings for one station, the way a field unit does:
//! - Temperature 15-30 °C, with an occasional -999 sensor glitch
//! - Humidity 30-60 %
//! - A rare simulated total outage that stops the station for good
//!
//! # Usage
//! ```bash
//! STATION_ID=WS-01 ./station-sim --broker-url mqtt://localhost:1883 --interval 2
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use rand::prelude::*;
use rumqttc::{AsyncClient, Event, Outgoing, QoS};
use tracing::{debug, info, warn};

use weather_monitor::acquisition::mqtt::mqtt_options;
use weather_monitor::acquisition::BrokerEndpoint;
use weather_monitor::config::defaults::{
    DEFAULT_KEEP_ALIVE_SECS, DEFAULT_REQUEST_CHANNEL_CAPACITY, DEFAULT_SIM_BROKER_URL,
    DEFAULT_SIM_GLITCH_RATE, DEFAULT_SIM_INTERVAL_SECS, DEFAULT_SIM_OUTAGE_RATE,
    DEFAULT_SIM_STATION_ID, DEFAULT_TOPIC,
};
use weather_monitor::types::{Measurement, Reading, Timestamp};

/// Value a broken thermometer reports.
const GLITCH_TEMPERATURE: f64 = -999.0;

/// Upper bound on waiting for DISCONNECT to reach the broker at shutdown.
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

const TEMPERATURE_RANGE: (f64, f64) = (15.0, 30.0);
const HUMIDITY_RANGE: (f64, f64) = (30.0, 60.0);

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "station-sim")]
#[command(about = "Weather station simulator publishing JSON readings over MQTT")]
#[command(version)]
struct Args {
    /// Broker URL (mqtt://host[:port] or ws://host:port)
    #[arg(long, env = "BROKER_URL", default_value = DEFAULT_SIM_BROKER_URL)]
    broker_url: String,

    /// Station identifier published in every reading
    #[arg(long, env = "STATION_ID", default_value = DEFAULT_SIM_STATION_ID)]
    station_id: String,

    /// Seconds between readings
    #[arg(long, env = "INTERVAL", default_value_t = DEFAULT_SIM_INTERVAL_SECS)]
    interval: u64,

    /// Topic to publish on
    #[arg(long, default_value = DEFAULT_TOPIC)]
    topic: String,

    /// Probability per reading of a -999 temperature glitch
    #[arg(long, default_value_t = DEFAULT_SIM_GLITCH_RATE)]
    glitch_rate: f64,

    /// Probability per tick of a simulated total outage
    #[arg(long, default_value_t = DEFAULT_SIM_OUTAGE_RATE)]
    outage_rate: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,
}

// ============================================================================
// Reading Generation
// ============================================================================

/// Round to one decimal place.
fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// True once the event loop has written DISCONNECT to the socket.
fn disconnect_flushed(event: &Event) -> bool {
    matches!(event, Event::Outgoing(Outgoing::Disconnect))
}

/// Generate one reading for `station_id`.
fn generate_reading<R: Rng>(rng: &mut R, station_id: &str, glitch_rate: f64) -> Reading {
    let temperature = if rng.gen_bool(glitch_rate.clamp(0.0, 1.0)) {
        GLITCH_TEMPERATURE
    } else {
        round1(rng.gen_range(TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1))
    };

    Reading {
        station_id: station_id.to_string(),
        temperature: Measurement::Numeric(temperature),
        humidity: Measurement::Numeric(round1(
            rng.gen_range(HUMIDITY_RANGE.0..=HUMIDITY_RANGE.1),
        )),
        timestamp: Timestamp::Text(Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let endpoint: BrokerEndpoint = args
        .broker_url
        .parse()
        .context("Invalid --broker-url")?;

    let mut rng: StdRng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let client_id = format!("station-sim-{}", args.station_id);
    let options = mqtt_options(
        &endpoint,
        &client_id,
        Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
    );
    let (client, mut eventloop) = AsyncClient::new(options, DEFAULT_REQUEST_CHANNEL_CAPACITY);

    // Drive the connection; rumqttc reconnects on the next poll after an error.
    let mut driver = tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(event) if disconnect_flushed(&event) => {
                    debug!("DISCONNECT sent");
                    break;
                }
                Ok(event) => debug!(?event, "MQTT event"),
                Err(e) => {
                    warn!(error = %e, "MQTT connection error, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    info!(
        station = %args.station_id,
        broker = %endpoint,
        interval_secs = args.interval,
        "Station simulator started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval.max(1)));
    loop {
        ticker.tick().await;

        if rng.gen_bool(args.outage_rate.clamp(0.0, 1.0)) {
            warn!(station = %args.station_id, "Simulated total outage, station going dark");
            break;
        }

        let reading = generate_reading(&mut rng, &args.station_id, args.glitch_rate);
        let payload = serde_json::to_vec(&reading)?;
        client
            .publish(args.topic.as_str(), QoS::AtMostOnce, false, payload)
            .await
            .context("Failed to queue reading for publish")?;
        info!(
            station = %args.station_id,
            temperature = %reading.temperature,
            humidity = %reading.humidity,
            "Published reading"
        );
    }

    match client.disconnect().await {
        Ok(()) => {
            if tokio::time::timeout(DISCONNECT_GRACE, &mut driver).await.is_err() {
                warn!("Broker unreachable, DISCONNECT not delivered");
                driver.abort();
            }
        }
        Err(e) => {
            warn!(error = %e, "Disconnect failed");
            driver.abort();
        }
    }
    Ok(())
}
