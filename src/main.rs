//! # Loko Decode
//!
//! Decode telemetry frames received from Loko LoRa peer-to-peer trackers.
//!
//! Frames are given on the command line or read from stdin, one per line:
//! hex-encoded binary frames (15, 18 or 25 bytes) or text-mode lines
//! `"<id1>,<id2>,<base64>"`. Each decoded frame is written to stdout as a
//! JSON line; logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use loko_p2p::codec::cipher::P2pKey;
use loko_p2p::config::{Config, LoggingConfig};
use loko_p2p::receiver::LineDecoder;
use loko_p2p::telemetry::{WriterSink, OutputFormat, TelemetrySink};

/// Name of the rotated log files under `logging.dir`
const LOG_FILE_PREFIX: &str = "loko-decode.log";

/// Decode Loko P2P tracker frames.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// P2P key as hex, overrides the configuration file
    #[arg(short, long)]
    key: Option<String>,

    /// Output format
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Echo each input line in its record
    #[arg(long)]
    include_raw: bool,

    /// Stop at the first frame that fails to decode
    #[arg(long)]
    strict: bool,

    /// Frames to decode; stdin is read when none are given
    inputs: Vec<String>,
}

/// Main entry point for the decoder
///
/// 1. Load configuration, apply command line overrides
/// 2. Set up logging (stderr, plus rotated files if configured)
/// 3. Decode the given frames, or stdin line by line until EOF or Ctrl+C
///
/// # Errors
///
/// Returns error if the configuration or key is invalid, output cannot be
/// written, or a frame fails to decode in strict mode.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &cli);

    let _log_guard = init_logging(&config.logging)?;

    info!("Loko Decode v{} starting...", env!("CARGO_PKG_VERSION"));

    let key = match &cli.key {
        Some(key_hex) => Some(P2pKey::from_hex(key_hex).context("invalid --key")?),
        None => config.p2p_key().context("invalid decoder.p2p_key_hex")?,
    };
    match &key {
        Some(key) => info!("P2P key loaded (AES-{})", key.bits()),
        None => warn!("No P2P key configured, encrypted frames will be rejected"),
    }

    let sink = WriterSink::new(std::io::stdout().lock(), config.output.format);
    let mut decoder = LineDecoder::new(sink, key)
        .include_raw(config.output.include_raw)
        .strict(config.decoder.strict);

    if !cli.inputs.is_empty() {
        for input in &cli.inputs {
            decoder.process_line(input)?;
        }
        let stats = decoder.stats();
        decoder.into_sink().flush()?;
        info!("Decoded {} of {} frames", stats.decoded, stats.lines);
        return Ok(());
    }

    info!("Reading frames from stdin");
    info!("Press Ctrl+C to exit");

    let stdin = BufReader::new(tokio::io::stdin());
    let interrupted = tokio::select! {
        result = decoder.run(stdin) => {
            result?;
            false
        }

        // Handle Ctrl+C for graceful shutdown
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        info!("Received Ctrl+C, shutting down...");
        info!("Total frames decoded: {}", decoder.stats().decoded);
    }

    decoder.into_sink().flush()?;
    Ok(())
}

/// Apply command line flags on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if cli.include_raw {
        config.output.include_raw = true;
    }
    if cli.strict {
        config.decoder.strict = true;
    }
}

/// Install the tracing subscriber
///
/// `RUST_LOG` takes precedence over `logging.level`. The returned guard must
/// be held until exit so buffered file logs are flushed.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("invalid log filter")?;
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &config.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            Ok(None)
        }
    }
}
