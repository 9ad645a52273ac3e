//! Layered configuration for the pipeline.
//!
//! Values resolve in three layers, later layers winning:
//! built-in defaults ← optional `labelpipe.toml` ← environment variables.
//!
//! # Configuration File Format
//!
//! ```toml
//! labeler_model = "gpt-5-mini"
//! critic_model = "gpt-5-mini"
//! temperature = 0.1
//! max_tokens = 4096
//! request_timeout_secs = 120
//! max_retries = 3
//! min_confidence_threshold = 85
//! review_queue_dir = "data/review_queue"
//! rubric_dir = "config/rubrics"
//! ```
//!
//! The API key is only ever read from the environment (`OPENAI_API_KEY`);
//! `main` loads a `.env` file first via `dotenvy`, so a key in `.env` works
//! the same as an exported variable.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_min_confidence_threshold() -> u8 {
    85
}

fn default_review_queue_dir() -> PathBuf {
    PathBuf::from("data/review_queue")
}

fn default_rubric_dir() -> PathBuf {
    PathBuf::from("config/rubrics")
}

/// Runtime configuration, shared read-only across runs.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Completion-service API key; environment only, never the toml file.
    #[serde(skip)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub labeler_model: String,
    #[serde(default = "default_model")]
    pub critic_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Task-level critique-rejection budget.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Confidence floor applied by the validator.
    #[serde(default = "default_min_confidence_threshold")]
    pub min_confidence_threshold: u8,
    #[serde(default = "default_review_queue_dir")]
    pub review_queue_dir: PathBuf,
    #[serde(default = "default_rubric_dir")]
    pub rubric_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        // Deserializing an empty table applies every serde default.
        toml::from_str("").expect("empty config table deserializes with defaults")
    }
}

impl Config {
    /// Load configuration: defaults, then the toml file (explicit path, or
    /// `labelpipe.toml` in the current directory if present), then the
    /// environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = Path::new("labelpipe.toml");
                if implicit.exists() {
                    Self::from_file(implicit)?
                } else {
                    Self::default()
                }
            }
        };
        config.overlay(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply environment-shaped overrides from an arbitrary lookup.
    ///
    /// Invalid numeric values keep the current value and log a warning
    /// rather than failing startup.
    pub fn overlay(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("OPENAI_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = get("LABELER_MODEL") {
            self.labeler_model = v;
        }
        if let Some(v) = get("CRITIC_MODEL") {
            self.critic_model = v;
        }
        overlay_parsed(&mut self.temperature, "TEMPERATURE", &get);
        overlay_parsed(&mut self.max_tokens, "MAX_TOKENS", &get);
        overlay_parsed(&mut self.request_timeout_secs, "REQUEST_TIMEOUT_SECS", &get);
        overlay_parsed(&mut self.max_retries, "LABELPIPE_MAX_RETRIES", &get);
        overlay_parsed(
            &mut self.min_confidence_threshold,
            "LABELPIPE_MIN_CONFIDENCE",
            &get,
        );
        if let Some(v) = get("LABELPIPE_REVIEW_QUEUE_DIR") {
            self.review_queue_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LABELPIPE_RUBRIC_DIR") {
            self.rubric_dir = PathBuf::from(v);
        }
    }
}

fn overlay_parsed<T: std::str::FromStr>(
    slot: &mut T,
    key: &str,
    get: &impl Fn(&str) -> Option<String>,
) {
    if let Some(raw) = get(key) {
        match raw.parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => warn!(key, value = %raw, "ignoring unparseable config override"),
        }
    }
}
