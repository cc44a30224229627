//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Broker
// ============================================================================

/// Broker URL used when neither config file nor CLI provide one.
pub const DEFAULT_BROKER_URL: &str = "ws://localhost:9001";

/// MQTT client id of the monitor.
pub const DEFAULT_CLIENT_ID: &str = "weather-monitor";

/// The single telemetry topic stations publish on.
pub const DEFAULT_TOPIC: &str = "weather";

/// Pause between reconnect attempts (ms). Fixed, no backoff.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 5_000;

/// MQTT keep-alive (seconds).
pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 60;

/// Capacity of the client -> event loop request channel inside `rumqttc`.
pub const DEFAULT_REQUEST_CHANNEL_CAPACITY: usize = 10;

// ============================================================================
// Pipeline
// ============================================================================

/// Capacity of the transport -> ingestion message channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Log a progress line every N processed messages.
pub const PROGRESS_LOG_INTERVAL: u64 = 100;

// ============================================================================
// Simulator
// ============================================================================

/// Broker the station simulator publishes to.
pub const DEFAULT_SIM_BROKER_URL: &str = "mqtt://localhost:1883";

/// Station id used when `STATION_ID` is unset.
pub const DEFAULT_SIM_STATION_ID: &str = "WS-XX";

/// Seconds between published readings.
pub const DEFAULT_SIM_INTERVAL_SECS: u64 = 5;

/// Probability per reading of a -999 sensor glitch.
pub const DEFAULT_SIM_GLITCH_RATE: f64 = 0.01;

/// Probability per tick of a simulated total station outage.
pub const DEFAULT_SIM_OUTAGE_RATE: f64 = 0.005;
