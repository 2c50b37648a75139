//! Configuration management for repolens
//!
//! Settings load from environment variables with sensible defaults and can be
//! overridden by CLI flags in the handlers.
//!
//! # Environment Variables
//!
//! - `REPOLENS_ENDPOINT`: OpenAI-compatible endpoint - default: "http://localhost:11434"
//! - `REPOLENS_MODEL`: Model name - default: "qwen2.5-coder:7b"
//! - `REPOLENS_API_KEY`: API key, required for non-local endpoints
//! - `REPOLENS_TIMEOUT`: Request timeout in seconds - default: "120"
//! - `REPOLENS_FETCH_CONCURRENCY`: Parallel file fetches per unit - default: "8"
//! - `REPOLENS_MAX_FILE_BYTES`: Per-file content budget - default: "65536"
//! - `REPOLENS_INPUT_PRICE` / `REPOLENS_OUTPUT_PRICE`: USD per 1M tokens - default: "0"
//! - `REPOLENS_STORE_DIR`: Analysis store directory - default: user cache dir + "repolens"
//! - `REPOLENS_LOG_LEVEL`: Logging level - default: "info"

use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::TokenUsage;

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_FETCH_CONCURRENCY: usize = 8;
const DEFAULT_MAX_FILE_BYTES: usize = 65_536;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No repository coordinate was provided for an analysis
    #[error("Repository locator is empty")]
    MissingLocator,

    /// A hosted endpoint needs credentials
    #[error("API key required for endpoint {endpoint}. Set REPOLENS_API_KEY")]
    MissingApiKey { endpoint: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Main configuration structure for repolens
///
/// Constructed via `Default::default()`, which reads `REPOLENS_*` environment
/// variables and falls back to defaults for anything missing.
#[derive(Debug, Clone)]
pub struct RepolensConfig {
    /// OpenAI-compatible endpoint URL
    pub endpoint: String,

    /// Model name to use for summarization
    pub model: String,

    /// API key; optional for local endpoints
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Bounded parallelism for fetching one unit's files
    pub fetch_concurrency: usize,

    /// Per-file content budget before truncation
    pub max_file_bytes: usize,

    /// USD per million input tokens
    pub input_price: f64,

    /// USD per million output tokens
    pub output_price: f64,

    /// Directory of the JSON file store
    pub store_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for RepolensConfig {
    fn default() -> Self {
        let endpoint =
            env::var("REPOLENS_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        let model = env::var("REPOLENS_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let api_key = env::var("REPOLENS_API_KEY").ok().filter(|k| !k.is_empty());

        let request_timeout_secs = env::var("REPOLENS_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let fetch_concurrency = env::var("REPOLENS_FETCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_FETCH_CONCURRENCY);

        let max_file_bytes = env::var("REPOLENS_MAX_FILE_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_FILE_BYTES);

        let input_price = env::var("REPOLENS_INPUT_PRICE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);

        let output_price = env::var("REPOLENS_OUTPUT_PRICE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0);

        let store_dir = env::var("REPOLENS_STORE_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::cache_dir()
                    .unwrap_or_else(env::temp_dir)
                    .join("repolens")
            });

        let log_level = env::var("REPOLENS_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            endpoint,
            model,
            api_key,
            request_timeout_secs,
            fetch_concurrency,
            max_file_bytes,
            input_price,
            output_price,
            store_dir,
            log_level,
        }
    }
}

impl RepolensConfig {
    /// Validates the configuration
    ///
    /// Checks numeric ranges, the log level, and that hosted endpoints carry
    /// an API key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.fetch_concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "Fetch concurrency must be at least 1".to_string(),
            ));
        }

        if self.max_file_bytes < 256 {
            return Err(ConfigError::ValidationFailed(
                "Max file size must be at least 256 bytes".to_string(),
            ));
        }

        if self.input_price < 0.0 || self.output_price < 0.0 {
            return Err(ConfigError::ValidationFailed(
                "Token prices cannot be negative".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if !self.endpoint_is_local() && self.api_key.is_none() {
            return Err(ConfigError::MissingApiKey {
                endpoint: self.endpoint.clone(),
            });
        }

        Ok(())
    }

    /// Whether the endpoint points at the local machine
    pub fn endpoint_is_local(&self) -> bool {
        let host = self
            .endpoint
            .trim_start_matches("http://")
            .trim_start_matches("https://");

        host.starts_with("localhost") || host.starts_with("127.0.0.1") || host.starts_with("[::1]")
    }

    /// Cost of one AI call at the configured prices
    pub fn cost_of(&self, usage: &TokenUsage) -> f64 {
        usage.input_tokens as f64 / 1_000_000.0 * self.input_price
            + usage.output_tokens as f64 / 1_000_000.0 * self.output_price
    }
}

impl fmt::Display for RepolensConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repolens Configuration:")?;
        writeln!(f, "  Endpoint: {}", self.endpoint)?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  API Key: {}", if self.api_key.is_some() { "set" } else { "unset" })?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Fetch Concurrency: {}", self.fetch_concurrency)?;
        writeln!(f, "  Max File Size: {} bytes", self.max_file_bytes)?;
        writeln!(
            f,
            "  Prices: ${}/1M in, ${}/1M out",
            self.input_price, self.output_price
        )?;
        writeln!(f, "  Store Dir: {}", self.store_dir.display())?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
