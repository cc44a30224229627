//! Weather Monitor: live telemetry for distributed weather stations
//!
//! Subscribes to the `weather` MQTT topic, validates every reading against
//! physical plausibility bounds and keeps a latest-state table per station.
//!
//! ## Architecture
//!
//! - **Acquisition**: MQTT session, subscription, fixed-interval reconnect loop
//! - **Processing**: JSON decoding and plausibility validation
//! - **Registry**: latest record per station, single writer
//! - **Pipeline**: serialized decode -> validate -> upsert -> render
//! - **Presenter**: full-refresh station table (text or JSON)

pub mod acquisition;
pub mod config;
pub mod pipeline;
pub mod presenter;
pub mod processing;
pub mod registry;
pub mod types;

// Re-export configuration
pub use config::{MonitorConfig, OutputFormat};

// Re-export commonly used types
pub use types::{Measurement, Reading, Snapshot, StationRecord, Timestamp, ValidationResult};

// Re-export pipeline components
pub use acquisition::{ConnectionState, InboundMessage, TransportAdapter, TransportError};
pub use pipeline::{IngestStats, Ingestor};
pub use presenter::{JsonPresenter, Presenter, TerminalPresenter};
pub use registry::StationRegistry;
