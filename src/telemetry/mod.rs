//! # Telemetry Module
//!
//! Turns decoded frames into timestamped output records.
//!
//! This module handles:
//! - Stamping decoded telemetry with its reception time
//! - Formatting as JSONL (JSON Lines) or a human-readable line
//! - Writing records to any `std::io::Write` sink

pub mod record;
pub mod sink;

pub use record::TelemetryRecord;
pub use sink::{WriterSink, OutputFormat, TelemetrySink};
