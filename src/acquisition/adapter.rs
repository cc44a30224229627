//! Transport adapter: connection supervision for the telemetry topic.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Subscribed
//!                     ^              |            |
//!                     +--------------+------------+   (transport error)
//! ```
//!
//! The adapter never gives up: every connection error is followed by a pause
//! of the configured interval and a fresh attempt. Only cancellation ends
//! [`TransportAdapter::run`].

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::endpoint::BrokerEndpoint;
use super::transport::{BusSession, Dialer, SessionEvent, TransportError};

/// Process-level connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Subscribed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Subscribed => "subscribed",
        };
        f.write_str(s)
    }
}

/// Transport health counters.
#[derive(Debug, Clone, Serialize)]
pub struct TransportStats {
    pub state: ConnectionState,
    /// Successful broker handshakes, initial connection included
    pub connections: u64,
    pub reconnect_attempts: u64,
    pub subscribe_failures: u64,
    pub messages_received: u64,
}

impl Default for TransportStats {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            connections: 0,
            reconnect_attempts: 0,
            subscribe_failures: 0,
            messages_received: 0,
        }
    }
}

/// Supervises one broker session and forwards its messages to the pipeline.
pub struct TransportAdapter<D: Dialer> {
    dialer: D,
    session: Option<D::Session>,
    endpoint: Option<BrokerEndpoint>,
    reconnect_interval: Duration,
    state_tx: watch::Sender<ConnectionState>,
    stats: TransportStats,
}

impl<D: Dialer> TransportAdapter<D> {
    pub fn new(dialer: D) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            dialer,
            session: None,
            endpoint: None,
            reconnect_interval: Duration::from_millis(
                crate::config::defaults::DEFAULT_RECONNECT_INTERVAL_MS,
            ),
            state_tx,
            stats: TransportStats::default(),
        }
    }

    /// Open the broker session.
    ///
    /// Idempotent: once a session exists it is returned as-is and nothing is
    /// dialled, whatever arguments are passed.
    pub fn connect(
        &mut self,
        url: &str,
        reconnect_interval: Duration,
    ) -> Result<&mut D::Session, TransportError> {
        if let Some(ref endpoint) = self.endpoint {
            debug!(endpoint = %endpoint, "Broker session already open, reusing it");
        } else {
            let endpoint: BrokerEndpoint = url.parse()?;
            info!(endpoint = %endpoint, reconnect_ms = reconnect_interval.as_millis() as u64, "Connecting to MQTT broker");
            let session = self.dialer.dial(&endpoint)?;
            self.session = Some(session);
            self.endpoint = Some(endpoint);
            self.reconnect_interval = reconnect_interval;
            self.set_state(ConnectionState::Connecting);
        }
        self.session.as_mut().ok_or(TransportError::NotConnected)
    }

    /// Observe lifecycle transitions.
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ConnectionState {
        self.stats.state
    }

    pub fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Drive the session until cancelled.
    ///
    /// Subscribes to `topic` on every successful (re)connection and forwards
    /// each delivered message to `tx` in broker order. Returns the final
    /// counters; dropping `tx` on return lets the consumer finish.
    pub async fn run(
        mut self,
        topic: String,
        tx: mpsc::Sender<super::InboundMessage>,
        cancel: CancellationToken,
    ) -> Result<TransportStats, TransportError> {
        let mut session = self.session.take().ok_or(TransportError::NotConnected)?;
        let mut consecutive_failures: u64 = 0;

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("[Transport] Shutdown signal received");
                    break;
                }
                event = session.next_event() => event,
            };

            match event {
                Ok(SessionEvent::Connected) => {
                    consecutive_failures = 0;
                    self.stats.connections += 1;
                    self.set_state(ConnectionState::Connected);
                    info!(connections = self.stats.connections, "Connected to MQTT broker");

                    match session.subscribe(&topic) {
                        Ok(()) => debug!(topic = %topic, "Subscribe request queued"),
                        Err(e) => {
                            self.stats.subscribe_failures += 1;
                            error!(topic = %topic, error = %e, "Failed to subscribe to topic");
                        }
                    }
                }
                Ok(SessionEvent::SubscriptionAck { accepted: true }) => {
                    self.set_state(ConnectionState::Subscribed);
                    info!(topic = %topic, "Subscribed to topic");
                }
                Ok(SessionEvent::SubscriptionAck { accepted: false }) => {
                    self.stats.subscribe_failures += 1;
                    error!(topic = %topic, "Broker rejected subscription");
                }
                Ok(SessionEvent::Message(message)) => {
                    self.stats.messages_received += 1;
                    // A stalled consumer must not block shutdown.
                    let sent = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            info!("[Transport] Shutdown signal received while forwarding");
                            break;
                        }
                        sent = tx.send(message) => sent,
                    };
                    if sent.is_err() {
                        warn!("[Transport] Message consumer gone, stopping");
                        break;
                    }
                }
                Ok(SessionEvent::Idle) => {}
                Err(e) => {
                    consecutive_failures += 1;
                    self.stats.reconnect_attempts += 1;
                    self.set_state(ConnectionState::Connecting);
                    warn!(
                        attempt = consecutive_failures,
                        retry_in_ms = self.reconnect_interval.as_millis() as u64,
                        error = %e,
                        "MQTT connection lost, reconnecting"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            info!("[Transport] Shutdown signal received during reconnect wait");
                            break;
                        }
                        _ = tokio::time::sleep(self.reconnect_interval) => {}
                    }
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        Ok(self.stats)
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.stats.state != state {
            debug!(from = %self.stats.state, to = %state, "Connection state change");
        }
        self.stats.state = state;
        self.state_tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct IdleSession;

    #[async_trait]
    impl BusSession for IdleSession {
        async fn next_event(&mut self) -> Result<SessionEvent, TransportError> {
            std::future::pending().await
        }

        fn subscribe(&mut self, _topic: &str) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingDialer {
        dials: Arc<AtomicUsize>,
    }

    impl Dialer for CountingDialer {
        type Session = IdleSession;

        fn dial(&self, _endpoint: &BrokerEndpoint) -> Result<IdleSession, TransportError> {
            self.dials.fetch_add(1, Ordering::SeqCst);
            Ok(IdleSession)
        }
    }

    #[test]
    fn test_connect_is_idempotent() {
        let dialer = CountingDialer::default();
        let dials = dialer.dials.clone();
        let mut adapter = TransportAdapter::new(dialer);

        adapter
            .connect("ws://localhost:9001", Duration::from_millis(5000))
            .unwrap();
        adapter
            .connect("ws://localhost:9001", Duration::from_millis(5000))
            .unwrap();

        assert_eq!(dials.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_connect_rejects_bad_url_without_dialling() {
        let dialer = CountingDialer::default();
        let dials = dialer.dials.clone();
        let mut adapter = TransportAdapter::new(dialer);

        let err = tokio_test::assert_err!(
            adapter.connect("localhost:9001", Duration::from_millis(5000))
        );
        assert!(matches!(err, TransportError::InvalidEndpoint { .. }));
        assert_eq!(dials.load(Ordering::SeqCst), 0);
        assert_eq!(adapter.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_run_requires_connect() {
        let adapter = TransportAdapter::new(CountingDialer::default());
        let (tx, _rx) = mpsc::channel(1);
        let result = adapter
            .run("weather".to_string(), tx, CancellationToken::new())
            .await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let mut adapter = TransportAdapter::new(CountingDialer::default());
        adapter
            .connect("ws://localhost:9001", Duration::from_millis(10))
            .unwrap();
        let mut states = adapter.state_watch();
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = adapter.run("weather".to_string(), tx, cancel).await.unwrap();
        assert_eq!(stats.state, ConnectionState::Disconnected);
        assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);
    }
}
