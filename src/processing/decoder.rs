//! JSON payload decoder for station readings.

use crate::types::Reading;
use thiserror::Error;

/// Upper bound on accepted payload size. Station readings are well under 1 KiB.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// A payload that is not a structurally valid reading.
///
/// Dropped by the ingestion loop; never reaches the registry.
#[derive(Debug, Error)]
pub enum MalformedPayload {
    #[error("payload of {len} bytes exceeds limit of {MAX_PAYLOAD_BYTES} bytes")]
    TooLarge { len: usize },

    #[error("invalid reading JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("stationId is empty")]
    EmptyStationId,
}

/// Decode a raw message payload into a [`Reading`].
///
/// Missing fields, a non-string `stationId` and a `timestamp` that is neither
/// string nor number are rejected. Non-numeric temperature or humidity values
/// decode fine and are left to the validator.
pub fn decode(payload: &[u8]) -> Result<Reading, MalformedPayload> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(MalformedPayload::TooLarge { len: payload.len() });
    }

    let reading: Reading = serde_json::from_slice(payload)?;

    if reading.station_id.trim().is_empty() {
        return Err(MalformedPayload::EmptyStationId);
    }

    Ok(reading)
}
