//! Reader configuration.
//!
//! Every knob has a sensible default, so
//! `ReaderConfig::default()` is a complete configuration. A TOML file may
//! override any subset of fields:
//!
//! ```
//! use marginalia::ReaderConfig;
//!
//! let config = ReaderConfig::from_toml_str("summary_interval = 2000\nmodel = \"mistral-small\"")?;
//! assert_eq!(config.summary_interval, 2000);
//! assert_eq!(config.debounce_ms, 800);
//! # Ok::<(), marginalia::Error>(())
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "MISTRAL_API_KEY";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Characters between summary boundary markers.
    pub summary_interval: usize,
    /// Delay before a pending selection is looked up.
    pub debounce_ms: u64,
    /// Word units scanned in each direction when composing a phrase.
    pub adjacency_window: usize,
    /// Pre-load margin handed to the viewport notifier.
    pub preload_margin_px: u32,
    /// Sections shorter than this are not summarized.
    pub min_summary_chars: usize,
    /// Characters of section text that feed the summary cache key.
    pub summary_key_prefix: usize,
    /// Section text sent for summarization is truncated to this many characters.
    pub max_summary_text: usize,
    pub endpoint: String,
    pub model: String,
    pub definition_max_tokens: u32,
    pub summary_max_tokens: u32,
    pub api_key: Option<String>,
    /// Ask again with a stricter prompt when the example omits the word.
    pub retry_example_without_word: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            summary_interval: 5000,
            debounce_ms: 800,
            adjacency_window: 10,
            preload_margin_px: 400,
            min_summary_chars: 100,
            summary_key_prefix: 100,
            max_summary_text: 8000,
            endpoint: "https://api.mistral.ai/v1/chat/completions".to_string(),
            model: "mistral-tiny".to_string(),
            definition_max_tokens: 150,
            summary_max_tokens: 500,
            api_key: None,
            retry_example_without_word: false,
        }
    }
}

impl ReaderConfig {
    /// Parse a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ReaderConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.summary_interval == 0 {
            return Err(Error::Config("summary_interval must be positive".into()));
        }
        if self.summary_key_prefix == 0 {
            return Err(Error::Config("summary_key_prefix must be positive".into()));
        }
        if self.endpoint.is_empty() {
            return Err(Error::Config("endpoint must not be empty".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// The configured API key, falling back to `MISTRAL_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}
