//! Station Registry - latest known state per station.
//!
//! Single-writer: the ingestion loop owns the registry and is the only code
//! that mutates it. Readers get an owned [`Snapshot`] copy.

use std::collections::HashMap;

use crate::types::{Reading, Snapshot, StationRecord, ValidationResult};

/// In-memory map from station id to its latest record.
///
/// Stations are kept in first-seen order so the rendered table stays stable
/// as readings arrive.
#[derive(Debug, Default)]
pub struct StationRegistry {
    entries: Vec<(String, StationRecord)>,
    index: HashMap<String, usize>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `station_id`.
    ///
    /// The new record replaces the old one entirely; no fields are merged.
    pub fn upsert(&mut self, station_id: &str, reading: &Reading, validation: &ValidationResult) {
        let record = StationRecord::from_reading(reading, validation);
        match self.index.get(station_id) {
            Some(&slot) => self.entries[slot].1 = record,
            None => {
                self.index.insert(station_id.to_string(), self.entries.len());
                self.entries.push((station_id.to_string(), record));
            }
        }
    }

    /// Owned copy of all records in first-seen order.
    pub fn snapshot(&self) -> Snapshot {
        self.entries.clone()
    }

    pub fn get(&self, station_id: &str) -> Option<&StationRecord> {
        self.index.get(station_id).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stations whose latest reading failed validation.
    pub fn flagged_count(&self) -> usize {
        self.entries.iter().filter(|(_, r)| !r.valid).count()
    }
}
