//! Serialized ingestion loop: decode -> validate -> upsert -> render.
//!
//! The [`Ingestor`] owns the registry and the presenter. It consumes the
//! transport channel on a single task, so two messages are never in the
//! pipeline at once and the registry needs no lock.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::acquisition::InboundMessage;
use crate::config::defaults::PROGRESS_LOG_INTERVAL;
use crate::presenter::Presenter;
use crate::processing::{decode, validate, MalformedPayload};
use crate::registry::StationRegistry;
use crate::types::ValidationResult;

/// Ingestion counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub messages_processed: u64,
    pub malformed_dropped: u64,
    /// Readings stored with `valid = false`
    pub flagged_readings: u64,
    pub stations_tracked: usize,
}

/// Owns all state needed for the ingestion loop.
pub struct Ingestor<P: Presenter> {
    registry: StationRegistry,
    presenter: P,
    stats: IngestStats,
}

impl<P: Presenter> Ingestor<P> {
    pub fn new(presenter: P) -> Self {
        Self::with_registry(StationRegistry::new(), presenter)
    }

    pub fn with_registry(registry: StationRegistry, presenter: P) -> Self {
        Self {
            registry,
            presenter,
            stats: IngestStats::default(),
        }
    }

    /// Run one message through the pipeline.
    ///
    /// A malformed payload is logged and counted; nothing is stored and
    /// nothing is rendered. Implausible readings are stored, flagged, and
    /// rendered like any other.
    pub fn process_message(
        &mut self,
        message: &InboundMessage,
    ) -> Result<ValidationResult, MalformedPayload> {
        let reading = match decode(&message.payload) {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.malformed_dropped += 1;
                error!(
                    topic = %message.topic,
                    bytes = message.payload.len(),
                    error = %e,
                    "Dropping malformed message"
                );
                return Err(e);
            }
        };

        let verdict = validate(&reading);
        if !verdict.valid {
            self.stats.flagged_readings += 1;
            debug!(
                station = %reading.station_id,
                issues = ?verdict.issues,
                "Implausible reading flagged"
            );
        }

        self.registry.upsert(&reading.station_id, &reading, &verdict);
        self.stats.messages_processed += 1;
        self.stats.stations_tracked = self.registry.len();

        self.presenter.render(&self.registry.snapshot());

        Ok(verdict)
    }

    /// Consume messages until the transport closes the channel.
    ///
    /// Returns final ingestion statistics.
    pub async fn run(mut self, mut rx: mpsc::Receiver<InboundMessage>) -> IngestStats {
        info!("[Ingestor] Processing station readings");

        while let Some(message) = rx.recv().await {
            if self.process_message(&message).is_err() {
                continue;
            }

            if self.stats.messages_processed % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    processed = self.stats.messages_processed,
                    stations = self.stats.stations_tracked,
                    flagged = self.registry.flagged_count(),
                    malformed = self.stats.malformed_dropped,
                    "Ingestion progress"
                );
            }
        }

        info!("[Ingestor] Message channel closed");
        self.stats
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Snapshot, StationRecord};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingPresenter {
        frames: Vec<Snapshot>,
    }

    impl Presenter for CountingPresenter {
        fn render(&mut self, snapshot: &[(String, StationRecord)]) {
            self.frames.push(snapshot.to_vec());
        }
    }

    fn msg(payload: &str) -> InboundMessage {
        InboundMessage::new("weather", payload.as_bytes().to_vec())
    }

    #[test]
    fn test_valid_message_renders_once() {
        let mut ingestor = Ingestor::new(CountingPresenter::default());
        let verdict = ingestor
            .process_message(&msg(
                r#"{"stationId":"S1","temperature":22.5,"humidity":55,"timestamp":"T1"}"#,
            ))
            .unwrap();
        assert!(verdict.valid);
        assert_eq!(ingestor.presenter().frames.len(), 1);
        assert_eq!(ingestor.stats().messages_processed, 1);
    }

    #[test]
    fn test_malformed_message_has_no_effect() {
        let mut ingestor = Ingestor::new(CountingPresenter::default());
        assert!(ingestor.process_message(&msg("{{garbage")).is_err());
        assert!(ingestor.registry().is_empty());
        assert!(ingestor.presenter().frames.is_empty());
        assert_eq!(ingestor.stats().malformed_dropped, 1);
        assert_eq!(ingestor.stats().messages_processed, 0);
    }

    #[test]
    fn test_malformed_message_logged_as_error() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        let mut ingestor = Ingestor::new(CountingPresenter::default());
        tracing::subscriber::with_default(subscriber, || {
            assert!(ingestor.process_message(&msg("not json")).is_err());
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = output
            .lines()
            .filter(|l| l.contains("Dropping malformed message"))
            .collect();
        assert_eq!(lines.len(), 1, "{output}");
        assert!(lines[0].contains("ERROR"), "{}", lines[0]);
    }

    #[test]
    fn test_flagged_reading_is_kept() {
        let mut ingestor = Ingestor::new(CountingPresenter::default());
        ingestor
            .process_message(&msg(
                r#"{"stationId":"S2","temperature":-999,"humidity":50,"timestamp":"T"}"#,
            ))
            .unwrap();
        assert_eq!(ingestor.stats().flagged_readings, 1);
        assert!(!ingestor.registry().get("S2").unwrap().valid);
    }

    #[tokio::test]
    async fn test_run_drains_channel_in_order() {
        let (tx, rx) = mpsc::channel(8);
        for (i, ts) in ["T1", "T2", "T3"].iter().enumerate() {
            let payload = format!(
                r#"{{"stationId":"S1","temperature":{i},"humidity":50,"timestamp":"{ts}"}}"#
            );
            tx.send(msg(&payload)).await.unwrap();
        }
        tx.send(msg("not json")).await.unwrap();
        drop(tx);

        let stats = Ingestor::new(CountingPresenter::default()).run(rx).await;
        assert_eq!(stats.messages_processed, 3);
        assert_eq!(stats.malformed_dropped, 1);
        assert_eq!(stats.stations_tracked, 1);
    }
}
