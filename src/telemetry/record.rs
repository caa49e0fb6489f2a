//! Output record wrapping one decoded frame.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::codec::protocol::DecodedTelemetry;

/// One line of decoder output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// When the frame was decoded
    pub received_at: DateTime<Utc>,

    /// Decoded fields, flattened into the record
    #[serde(flatten)]
    pub telemetry: DecodedTelemetry,

    /// Input line as received, when echoing is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl TelemetryRecord {
    /// Stamp a decoded frame with the current time
    pub fn now(telemetry: DecodedTelemetry) -> Self {
        Self::at(Utc::now(), telemetry)
    }

    /// Stamp a decoded frame with a given time
    pub fn at(received_at: DateTime<Utc>, telemetry: DecodedTelemetry) -> Self {
        Self {
            received_at,
            telemetry,
            raw: None,
        }
    }

    /// Attach the raw input line
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}
