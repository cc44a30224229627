//! Ingestion Pipeline Module
//!
//! ```text
//! Transport task --mpsc--> Ingestor task
//!                           1. decode   (malformed -> drop, log)
//!                           2. validate (implausible -> flag, keep)
//!                           3. upsert   (registry, single writer)
//!                           4. render   (full snapshot)
//! ```

pub mod processing_loop;

pub use processing_loop::{IngestStats, Ingestor};
