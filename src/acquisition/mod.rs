//! Telemetry acquisition module
//!
//! Handles the connection to the MQTT broker: endpoint parsing, session
//! creation, subscription and the supervised reconnect loop.

pub mod adapter;
pub mod endpoint;
pub mod mqtt;
pub mod transport;

pub use adapter::{ConnectionState, TransportAdapter, TransportStats};
pub use endpoint::{BrokerEndpoint, BrokerScheme};
pub use mqtt::{MqttDialer, MqttSession};
pub use transport::{BusSession, Dialer, InboundMessage, SessionEvent, TransportError};
