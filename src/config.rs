use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::confidence::CompressionMode;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub engine: EngineConfig,
    pub cache: CacheConfig,
}

/// Pipeline behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Aggressiveness mode selecting the minimum rule confidence.
    pub mode: CompressionMode,
    /// Maximum accepted input length in characters.
    pub max_input_chars: usize,
    /// Largest phrase window (in words) scanned by the phrase pass.
    pub max_phrase_words: usize,
}

/// Result cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached results before LRU eviction.
    pub capacity: usize,
    /// Disable result caching entirely (every call recomputes).
    pub enabled: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: CompressionMode::Default,
            max_input_chars: 100_000,
            max_phrase_words: 6,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            enabled: true,
        }
    }
}

impl CompressionConfig {
    /// Load configuration from a TOML file.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config at {}: {e} — using defaults",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!("No config file at {} — using defaults", path.display());
                Self::default()
            }
        }
    }
}
