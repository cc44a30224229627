//! Message processing - payload decoding and plausibility validation
//!
//! Both stages are pure: no I/O, no registry access. The ingestion loop in
//! [`crate::pipeline`] chains them per message.

mod decoder;
mod validator;

pub use decoder::{decode, MalformedPayload, MAX_PAYLOAD_BYTES};
pub use validator::{
    validate, HUMIDITY_MAX_PERCENT, HUMIDITY_MIN_PERCENT, TEMPERATURE_FLOOR_CELSIUS,
};
