//! Transport abstraction for the message bus.
//!
//! The adapter only depends on [`BusSession`] and [`Dialer`], so the
//! reconnect and subscription logic can run against a scripted session.

use async_trait::async_trait;
use thiserror::Error;

use super::endpoint::BrokerEndpoint;

/// Message bus errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid broker endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Broker refused connection: {0}")]
    Refused(String),

    #[error("Subscribe request failed: {0}")]
    Subscribe(String),

    #[error("Not connected")]
    NotConnected,
}

/// One message delivered by the broker, payload still undecoded.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Events surfaced by a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Broker accepted the connection (initial or after reconnect)
    Connected,
    /// Broker answered a subscribe request
    SubscriptionAck { accepted: bool },
    /// Application message on a subscribed topic
    Message(InboundMessage),
    /// Protocol traffic with no meaning for the pipeline (pings, acks)
    Idle,
}

/// A session with the broker.
///
/// `next_event` drives the connection: after an `Err`, the next call starts a
/// fresh connection attempt.
#[async_trait]
pub trait BusSession: Send + 'static {
    async fn next_event(&mut self) -> Result<SessionEvent, TransportError>;

    /// Queue a subscribe request. The broker's answer arrives later as
    /// [`SessionEvent::SubscriptionAck`].
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;
}

/// Creates sessions for an endpoint.
pub trait Dialer: Send + 'static {
    type Session: BusSession;

    fn dial(&self, endpoint: &BrokerEndpoint) -> Result<Self::Session, TransportError>;
}
