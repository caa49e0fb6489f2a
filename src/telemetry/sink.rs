//! Record sinks.

use std::io::Write;

use serde::Deserialize;

use super::record::TelemetryRecord;
use crate::error::Result;

/// How records are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Jsonl,
    /// Human-readable summary line
    Pretty,
}

/// Destination for decoded records
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink {
    /// Write one record
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()>;
}

/// Writes records line by line to any writer, as JSON or pretty text
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
    records_written: u64,
}

impl<W: Write> WriterSink<W> {
    /// Create a sink
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            records_written: 0,
        }
    }

    /// Number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TelemetrySink for WriterSink<W> {
    fn write_record(&mut self, record: &TelemetryRecord) -> Result<()> {
        match self.format {
            OutputFormat::Jsonl => {
                serde_json::to_writer(&mut self.writer, record)?;
                self.writer.write_all(b"\n")?;
            }
            OutputFormat::Pretty => writeln!(self.writer, "{}", pretty_line(record))?,
        }

        self.records_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn pretty_line(record: &TelemetryRecord) -> String {
    let t = &record.telemetry;
    let mut line = format!(
        "{} {:02},{:03} v{} {:.4},{:.4} {:.2}V",
        record.received_at.format("%Y-%m-%d %H:%M:%S"),
        t.id1,
        t.id2,
        t.packet_version,
        t.latitude,
        t.longitude,
        t.battery_volts
    );
    if let Some(altitude) = t.altitude_m {
        line.push_str(&format!(" alt={}m", altitude));
    }
    if let Some(speed) = t.speed_mps {
        line.push_str(&format!(" speed={}m/s", speed));
    }
    if t.integrity_ok {
        line.push_str(" [verified]");
    }
    line
}
