//! # Configuration Module
//!
//! Handles loading and validating decoder configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::codec::cipher::P2pKey;
use crate::error::{LokoError, Result};
use crate::telemetry::OutputFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Decoder configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DecoderConfig {
    /// P2P key as hex (32, 48 or 64 digits)
    #[serde(default)]
    pub p2p_key_hex: Option<String>,

    /// Stop at the first frame that fails to decode
    #[serde(default)]
    pub strict: bool,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Echo the input line in every record
    #[serde(default)]
    pub include_raw: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write logs to daily-rotated files under this directory
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

// Default value functions
fn default_log_level() -> String { "info".to_string() }

/// Accepted values for `logging.level`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use loko_p2p::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the P2P key, if one is configured
    ///
    /// # Errors
    ///
    /// Returns error if the configured key is not valid hex of a supported
    /// length.
    pub fn p2p_key(&self) -> Result<Option<P2pKey>> {
        self.decoder
            .p2p_key_hex
            .as_deref()
            .map(P2pKey::from_hex)
            .transpose()
            .map_err(LokoError::from)
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate key shape without keeping the expanded key around
        if let Some(key_hex) = &self.decoder.p2p_key_hex {
            let digits = key_hex.trim().len();
            if ![32, 48, 64].contains(&digits) {
                return Err(LokoError::Config(toml::de::Error::custom(format!(
                    "p2p_key_hex must be 32, 48 or 64 hex digits, got {}",
                    digits
                ))));
            }

            if !key_hex.trim().bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(LokoError::Config(toml::de::Error::custom(
                    "p2p_key_hex must contain only hex digits",
                )));
            }
        }

        // Validate log level
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(LokoError::Config(toml::de::Error::custom(format!(
                "logging level must be one of: {}",
                LOG_LEVELS.join(", ")
            ))));
        }

        if let Some(dir) = &self.logging.dir {
            if dir.is_empty() {
                return Err(LokoError::Config(toml::de::Error::custom(
                    "logging dir cannot be empty when set",
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO_KEY_HEX: &str = "0000000000000000000000000000000000000000000000000000000000000000";

    fn create_valid_config() -> Config {
        Config {
            decoder: DecoderConfig {
                p2p_key_hex: Some(ZERO_KEY_HEX.to_string()),
                strict: false,
            },
            output: OutputConfig {
                format: OutputFormat::Jsonl,
                include_raw: false,
            },
            logging: LoggingConfig {
                level: default_log_level(),
                dir: None,
            },
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.decoder.p2p_key_hex.is_none());
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_valid_config() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());

        let key = config.p2p_key().unwrap().unwrap();
        assert_eq!(key.bits(), 256);
    }

    #[test]
    fn test_no_key_configured() {
        let config = Config::default();
        assert!(config.p2p_key().unwrap().is_none());
    }

    #[test]
    fn test_key_wrong_length() {
        let mut config = create_valid_config();
        config.decoder.p2p_key_hex = Some("0011".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_not_hex() {
        let mut config = create_valid_config();
        config.decoder.p2p_key_hex = Some("zz".repeat(16));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_key_128_and_192_bits() {
        let mut config = create_valid_config();
        config.decoder.p2p_key_hex = Some("ab".repeat(16));
        assert!(config.validate().is_ok());
        assert_eq!(config.p2p_key().unwrap().unwrap().bits(), 128);

        config.decoder.p2p_key_hex = Some("ab".repeat(24));
        assert!(config.validate().is_ok());
        assert_eq!(config.p2p_key().unwrap().unwrap().bits(), 192);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir() {
        let mut config = create_valid_config();
        config.logging.dir = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert!(!config.decoder.strict);
        assert!(!config.output.include_raw);
    }

    #[test]
    fn test_from_toml_invalid_format() {
        let result = Config::from_toml("[output]\nformat = \"csv\"\n");
        assert!(matches!(result, Err(LokoError::Config(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = format!(
            r#"
[decoder]
p2p_key_hex = "{}"
strict = true

[output]
format = "pretty"
include_raw = true

[logging]
level = "debug"
"#,
            ZERO_KEY_HEX
        );

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert!(config.decoder.strict);
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert!(config.output.include_raw);
        assert_eq!(config.logging.level, "debug");
        assert!(config.p2p_key().unwrap().is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/loko.toml");
        assert!(matches!(result, Err(LokoError::Io(_))));
    }
}
