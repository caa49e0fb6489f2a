//! # Receiver Module
//!
//! Decodes a stream of received lines (hex-encoded binary frames or
//! text-mode frames) and hands the results to a [`TelemetrySink`].

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::codec::cipher::P2pKey;
use crate::codec::decoder::decode_line;
use crate::error::{LokoError, Result};
use crate::telemetry::{TelemetryRecord, TelemetrySink};

/// Lines starting with this are ignored
const COMMENT_PREFIX: char = '#';

/// Counters kept while decoding a stream
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecodeStats {
    /// Non-empty, non-comment lines seen
    pub lines: u64,

    /// Lines decoded and written
    pub decoded: u64,

    /// Lines that failed to decode
    pub failed: u64,

    /// Failures caused by a checksum mismatch (likely a wrong key)
    pub integrity_failures: u64,
}

/// Line-by-line decoder feeding a sink
pub struct LineDecoder<S: TelemetrySink> {
    sink: S,
    key: Option<P2pKey>,
    include_raw: bool,
    strict: bool,
    stats: DecodeStats,
    /// Input lines consumed, blanks and comments included
    position: u64,
    last_failed_line: Option<u64>,
}

impl<S: TelemetrySink> std::fmt::Debug for LineDecoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineDecoder")
            .field("has_key", &self.key.is_some())
            .field("include_raw", &self.include_raw)
            .field("strict", &self.strict)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: TelemetrySink> LineDecoder<S> {
    /// Create a decoder
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination for decoded records
    /// * `key` - P2P key for encrypted frames, if known
    pub fn new(sink: S, key: Option<P2pKey>) -> Self {
        Self {
            sink,
            key,
            include_raw: false,
            strict: false,
            stats: DecodeStats::default(),
            position: 0,
            last_failed_line: None,
        }
    }

    /// Echo each input line in its record
    pub fn include_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = include_raw;
        self
    }

    /// Fail on the first undecodable line instead of skipping it
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Counters so far
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// 1-based input line number of the most recent decode failure
    pub fn last_failed_line(&self) -> Option<u64> {
        self.last_failed_line
    }

    /// Recover the sink
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Decode one line and write the record
    ///
    /// Blank lines and `#` comments are skipped.
    ///
    /// # Returns
    ///
    /// * `Result<bool>` - `true` if a record was written
    ///
    /// # Errors
    ///
    /// Returns error if the sink fails, or in strict mode if the line does
    /// not decode.
    pub fn process_line(&mut self, line: &str) -> Result<bool> {
        self.position += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(COMMENT_PREFIX) {
            return Ok(false);
        }

        self.stats.lines += 1;

        let telemetry = match decode_line(line, self.key.as_ref()) {
            Ok(telemetry) => telemetry,
            Err(e) => {
                self.stats.failed += 1;
                self.last_failed_line = Some(self.position);
                if matches!(e, LokoError::Integrity(_)) {
                    self.stats.integrity_failures += 1;
                }
                if self.strict {
                    return Err(e);
                }
                warn!("Skipping line {}: {}", self.position, e);
                return Ok(false);
            }
        };

        debug!(
            "Decoded {:?} frame from {:02},{:03}",
            telemetry.variant, telemetry.id1, telemetry.id2
        );

        let mut record = TelemetryRecord::now(telemetry);
        if self.include_raw {
            record = record.with_raw(line);
        }

        self.sink.write_record(&record)?;
        self.stats.decoded += 1;
        Ok(true)
    }

    /// Decode every line from a reader until EOF
    ///
    /// # Errors
    ///
    /// Returns error on read or sink failure, or in strict mode on the first
    /// undecodable line.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> Result<DecodeStats> {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            self.process_line(&line)?;
            self.sink.flush()?;
        }

        info!(
            "Input finished: {} decoded, {} failed ({} integrity)",
            self.stats.decoded, self.stats.failed, self.stats.integrity_failures
        );
        Ok(self.stats)
    }
}
