//! MQTT session backed by `rumqttc`.
//!
//! `rumqttc` reconnects on the next `poll()` after an error, so the session
//! itself holds no retry logic. Pacing between attempts is the adapter's job.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Packet, QoS,
    SubscribeReasonCode, Transport,
};
use tracing::debug;

use super::endpoint::{BrokerEndpoint, BrokerScheme};
use super::transport::{BusSession, Dialer, InboundMessage, SessionEvent, TransportError};
use crate::config::defaults::{DEFAULT_KEEP_ALIVE_SECS, DEFAULT_REQUEST_CHANNEL_CAPACITY};

/// Build client options for an endpoint.
///
/// Clean session is always on: subscriptions are re-issued after every
/// reconnect rather than restored by the broker.
pub fn mqtt_options(endpoint: &BrokerEndpoint, client_id: &str, keep_alive: Duration) -> MqttOptions {
    let mut options = match endpoint.scheme {
        BrokerScheme::WebSocket => {
            let mut o = MqttOptions::new(client_id, endpoint.url(), endpoint.port);
            o.set_transport(Transport::Ws);
            o
        }
        BrokerScheme::Tcp => MqttOptions::new(client_id, endpoint.host.clone(), endpoint.port),
    };
    options.set_keep_alive(keep_alive);
    options.set_clean_session(true);
    options
}

/// Opens [`MqttSession`]s with fixed client settings.
#[derive(Debug, Clone)]
pub struct MqttDialer {
    client_id: String,
    keep_alive: Duration,
    request_capacity: usize,
    qos: QoS,
}

impl MqttDialer {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
            request_capacity: DEFAULT_REQUEST_CHANNEL_CAPACITY,
            qos: QoS::AtMostOnce,
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}

impl Dialer for MqttDialer {
    type Session = MqttSession;

    fn dial(&self, endpoint: &BrokerEndpoint) -> Result<MqttSession, TransportError> {
        let options = mqtt_options(endpoint, &self.client_id, self.keep_alive);
        let (client, eventloop) = AsyncClient::new(options, self.request_capacity);
        Ok(MqttSession {
            client,
            eventloop,
            qos: self.qos,
        })
    }
}

/// Live MQTT session. The connection is opened lazily by the first poll.
pub struct MqttSession {
    client: AsyncClient,
    eventloop: EventLoop,
    qos: QoS,
}

/// Translate one `EventLoop::poll` outcome.
///
/// rumqttc checks the CONNACK return code itself: a refused handshake
/// arrives as `ConnectionError::ConnectionRefused`, never as a `ConnAck`.
pub(crate) fn session_event(
    polled: Result<Event, ConnectionError>,
) -> Result<SessionEvent, TransportError> {
    match polled {
        Ok(Event::Incoming(Packet::ConnAck(_))) => Ok(SessionEvent::Connected),
        Ok(Event::Incoming(Packet::SubAck(ack))) => {
            let accepted = ack
                .return_codes
                .iter()
                .all(|code| !matches!(code, SubscribeReasonCode::Failure));
            Ok(SessionEvent::SubscriptionAck { accepted })
        }
        Ok(Event::Incoming(Packet::Publish(publish))) => Ok(SessionEvent::Message(
            InboundMessage::new(publish.topic, publish.payload.to_vec()),
        )),
        Ok(Event::Incoming(Packet::Disconnect)) => Err(TransportError::Connection(
            "broker sent DISCONNECT".to_string(),
        )),
        Ok(event) => {
            debug!(?event, "MQTT protocol event");
            Ok(SessionEvent::Idle)
        }
        Err(ConnectionError::ConnectionRefused(code)) => {
            Err(TransportError::Refused(format!("{code:?}")))
        }
        Err(e) => Err(TransportError::Connection(e.to_string())),
    }
}

#[async_trait]
impl BusSession for MqttSession {
    async fn next_event(&mut self) -> Result<SessionEvent, TransportError> {
        session_event(self.eventloop.poll().await)
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.client
            .try_subscribe(topic, self.qos)
            .map_err(|e| TransportError::Subscribe(e.to_string()))
    }
}
