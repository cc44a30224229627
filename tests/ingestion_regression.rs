//! Ingestion Regression Tests
//!
//! Drives raw payloads through the full decode -> validate -> upsert -> render
//! path of the `Ingestor` and asserts on registry contents and render calls.

use std::sync::{Arc, Mutex};

use weather_monitor::types::{Measurement, Snapshot, StationRecord, Timestamp};
use weather_monitor::{InboundMessage, Ingestor, Presenter};

/// Presenter that keeps every rendered snapshot for inspection.
#[derive(Clone, Default)]
struct RecordingPresenter {
    frames: Arc<Mutex<Vec<Snapshot>>>,
}

impl RecordingPresenter {
    fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    fn last_frame(&self) -> Snapshot {
        self.frames.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, snapshot: &[(String, StationRecord)]) {
        self.frames.lock().unwrap().push(snapshot.to_vec());
    }
}

fn message(payload: &str) -> InboundMessage {
    InboundMessage::new("weather", payload.as_bytes().to_vec())
}

const SCENARIO_A: &str = r#"{"stationId":"S1","temperature":22.5,"humidity":55,"timestamp":"T1"}"#;
const SCENARIO_B: &str = r#"{"stationId":"S2","temperature":-300,"humidity":55,"timestamp":"T2"}"#;
const SCENARIO_C: &str = r#"{"stationId":"S1","temperature":10,"humidity":40,"timestamp":"T3"}"#;

#[test]
fn scenario_a_valid_reading_is_stored_clean() {
    let presenter = RecordingPresenter::default();
    let mut ingestor = Ingestor::new(presenter.clone());

    ingestor.process_message(&message(SCENARIO_A)).unwrap();

    let record = ingestor.registry().get("S1").expect("S1 should be registered");
    assert!(record.valid);
    assert!(record.issues.is_empty());
    assert_eq!(record.temperature, Measurement::Numeric(22.5));
    assert_eq!(presenter.frame_count(), 1);
}

#[test]
fn scenario_b_implausible_reading_is_flagged_not_dropped() {
    let mut ingestor = Ingestor::new(RecordingPresenter::default());

    ingestor.process_message(&message(SCENARIO_B)).unwrap();

    let record = ingestor.registry().get("S2").expect("S2 should be registered");
    assert!(!record.valid);
    assert_eq!(record.issues.len(), 1);
    assert!(record.issues[0].contains("-300"), "issue: {}", record.issues[0]);
}

#[test]
fn scenario_c_newer_reading_overwrites_fully() {
    let mut ingestor = Ingestor::new(RecordingPresenter::default());

    ingestor.process_message(&message(SCENARIO_A)).unwrap();
    ingestor.process_message(&message(SCENARIO_C)).unwrap();

    let record = ingestor.registry().get("S1").unwrap();
    assert_eq!(record.temperature, Measurement::Numeric(10.0));
    assert_eq!(record.humidity, Measurement::Numeric(40.0));
    assert_eq!(record.timestamp, Timestamp::Text("T3".to_string()));
    assert!(record.valid);
    assert_eq!(ingestor.registry().len(), 1);
}

#[test]
fn flagged_station_recovers_on_next_good_reading() {
    let mut ingestor = Ingestor::new(RecordingPresenter::default());
    ingestor
        .process_message(&message(
            r#"{"stationId":"S1","temperature":-999,"humidity":130,"timestamp":"T1"}"#,
        ))
        .unwrap();
    assert_eq!(ingestor.registry().get("S1").unwrap().issues.len(), 2);

    ingestor.process_message(&message(SCENARIO_A)).unwrap();
    let record = ingestor.registry().get("S1").unwrap();
    assert!(record.valid);
    assert!(record.issues.is_empty(), "issues must not carry over");
}

#[test]
fn malformed_payload_leaves_registry_and_display_untouched() {
    let presenter = RecordingPresenter::default();
    let mut ingestor = Ingestor::new(presenter.clone());
    ingestor.process_message(&message(SCENARIO_A)).unwrap();
    let before = ingestor.registry().snapshot();

    let err = ingestor
        .process_message(&InboundMessage::new("weather", b"\x00\x01not-json".to_vec()))
        .unwrap_err();
    assert!(err.to_string().contains("invalid reading JSON"));

    assert_eq!(ingestor.registry().snapshot(), before);
    assert_eq!(presenter.frame_count(), 1, "no render for a dropped message");
    assert_eq!(ingestor.stats().malformed_dropped, 1);
}

#[test]
fn payload_without_station_id_is_dropped() {
    let presenter = RecordingPresenter::default();
    let mut ingestor = Ingestor::new(presenter.clone());

    assert!(ingestor
        .process_message(&message(r#"{"temperature":20,"humidity":50,"timestamp":"T"}"#))
        .is_err());

    assert!(ingestor.registry().is_empty());
    assert_eq!(presenter.frame_count(), 0);
}

#[test]
fn every_processed_message_triggers_full_render() {
    let presenter = RecordingPresenter::default();
    let mut ingestor = Ingestor::new(presenter.clone());

    for payload in [SCENARIO_A, SCENARIO_B, SCENARIO_C] {
        ingestor.process_message(&message(payload)).unwrap();
    }

    assert_eq!(presenter.frame_count(), 3);
    let last = presenter.last_frame();
    let ids: Vec<_> = last.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["S1", "S2"]);
    assert_eq!(last[0].1.timestamp, Timestamp::Text("T3".to_string()));
}

#[tokio::test]
async fn run_loop_processes_channel_in_delivery_order() {
    let presenter = RecordingPresenter::default();
    let (tx, rx) = tokio::sync::mpsc::channel(16);
    let handle = tokio::spawn(Ingestor::new(presenter.clone()).run(rx));

    tx.send(message(SCENARIO_A)).await.unwrap();
    tx.send(message("garbage")).await.unwrap();
    tx.send(message(SCENARIO_B)).await.unwrap();
    tx.send(message(SCENARIO_C)).await.unwrap();
    drop(tx);

    let stats = handle.await.unwrap();
    assert_eq!(stats.messages_processed, 3);
    assert_eq!(stats.malformed_dropped, 1);
    assert_eq!(stats.flagged_readings, 1);
    assert_eq!(stats.stations_tracked, 2);

    let last = presenter.last_frame();
    assert_eq!(last[0].1.timestamp, Timestamp::Text("T3".to_string()));
}
