//! Runtime settings sourced from the environment.
//!
//! `.env` files are honored via `dotenvy`; every knob except the API key
//! has a built-in default.

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;
use tracing::warn;

/// Default ceiling on uploaded file size (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    #[diagnostic(
        code(rowloom::config::missing_api_key),
        help("export OPENAI_API_KEY or add it to a .env file")
    )]
    MissingApiKey,
}

/// Settings for a running service instance.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    /// Directory uploaded input files are read from.
    pub upload_dir: PathBuf,
    /// Directory result files are written to.
    pub output_dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_file_size: u64,
    /// Pause between enrichment batches.
    pub batch_delay: Duration,
}

impl Settings {
    /// Loads settings from the process environment, reading `.env` first.
    /// Unparseable numeric values fall back to their defaults with a logged
    /// warning rather than failing startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Missing .env is fine; explicit environment still applies.
        let _ = dotenvy::dotenv();

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let upload_dir = var_or("UPLOAD_DIR", "uploads").into();
        let output_dir = var_or("OUTPUT_DIR", "outputs").into();
        let max_file_size = parse_or("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE);
        let batch_delay = Duration::from_secs_f64(parse_or("BATCH_DELAY_SECS", 1.0));

        Ok(Self {
            openai_api_key,
            upload_dir,
            output_dir,
            max_file_size,
            batch_delay,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "unparseable setting, using default");
            default
        }),
        Err(_) => default,
    }
}
