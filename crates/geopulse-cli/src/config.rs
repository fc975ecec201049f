//! Configuration file support for Geopulse
//!
//! Supports both YAML and TOML configuration files.
//!
//! # Example YAML configuration:
//! ```yaml
//! # Geopulse configuration file
//!
//! # Place index to resolve mentions against
//! places_file: data/places.sample.json
//!
//! # Playback cadence
//! playback:
//!   period_ms: 400
//!   alert_period_ms: 1200
//!
//! # Fuzzy match strictness
//! gazetteer:
//!   threshold: 0.3
//!
//! # Synthetic feed settings
//! synthetic:
//!   count: 1000
//!   window_days: 7
//!   seed: 42
//!
//! # Logging settings
//! logging:
//!   level: info
//!   format: text
//! ```

use geopulse_runtime::pipeline::UnresolvedPolicy;
use geopulse_runtime::source::MalformedPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Path to the place index (.json)
    pub places_file: Option<PathBuf>,

    /// Playback configuration
    pub playback: PlaybackConfig,

    /// Gazetteer configuration
    pub gazetteer: GazetteerConfig,

    /// Synthetic feed configuration
    pub synthetic: SyntheticConfig,

    /// Alert dataset configuration
    pub dataset: DatasetConfig,

    /// Pipeline configuration
    pub pipeline: PipelineConfig,

    /// Output configuration
    pub output: Option<OutputConfig>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Tick period for mention feeds, in milliseconds
    pub period_ms: u64,

    /// Tick period for alert datasets, in milliseconds
    pub alert_period_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            period_ms: 400,
            alert_period_ms: 1200,
        }
    }
}

/// Gazetteer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GazetteerConfig {
    /// Score strictly below this qualifies as a match (lower is better)
    pub threshold: f64,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self { threshold: 0.3 }
    }
}

/// Synthetic feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// Number of mentions to generate
    pub count: usize,

    /// Trailing window the timestamps are spread over, in days
    pub window_days: i64,

    /// RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            window_days: 7,
            seed: None,
        }
    }
}

/// Alert dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DatasetConfig {
    /// Alert dataset path (.json or JSON lines)
    pub alerts_file: Option<PathBuf>,

    /// Disposition of malformed records (fail, skip)
    pub malformed: MalformedPolicy,
}

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Disposition of unresolved mentions (drop, passthrough)
    pub unresolved: UnresolvedPolicy,

    /// Number of entries in published ranking snapshots
    pub top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            unresolved: UnresolvedPolicy::default(),
            top_n: 5,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Append kind-tagged JSON lines to this file
    pub jsonl: Option<PathBuf>,

    /// Print compact JSON lines to the console instead of pretty text
    pub compact: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,

    /// Include timestamps
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            timestamps: true,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML, auto-detected by extension)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml(&content),
            "toml" => Self::from_toml(&content),
            _ => {
                // Try YAML first, then TOML
                Self::from_yaml(&content).or_else(|_| Self::from_toml(&content))
            }
        }
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Merge another config into this one (other values take precedence if set)
    pub fn merge(&mut self, other: Config) {
        if other.places_file.is_some() {
            self.places_file = other.places_file;
        }

        // Merge playback config
        if other.playback.period_ms != PlaybackConfig::default().period_ms {
            self.playback.period_ms = other.playback.period_ms;
        }
        if other.playback.alert_period_ms != PlaybackConfig::default().alert_period_ms {
            self.playback.alert_period_ms = other.playback.alert_period_ms;
        }

        // Merge gazetteer config
        if other.gazetteer.threshold != GazetteerConfig::default().threshold {
            self.gazetteer.threshold = other.gazetteer.threshold;
        }

        // Merge synthetic config
        if other.synthetic.count != SyntheticConfig::default().count {
            self.synthetic.count = other.synthetic.count;
        }
        if other.synthetic.window_days != SyntheticConfig::default().window_days {
            self.synthetic.window_days = other.synthetic.window_days;
        }
        if other.synthetic.seed.is_some() {
            self.synthetic.seed = other.synthetic.seed;
        }

        // Merge dataset config
        if other.dataset.alerts_file.is_some() {
            self.dataset.alerts_file = other.dataset.alerts_file;
        }
        if other.dataset.malformed != MalformedPolicy::default() {
            self.dataset.malformed = other.dataset.malformed;
        }

        // Merge pipeline config
        if other.pipeline.unresolved != UnresolvedPolicy::default() {
            self.pipeline.unresolved = other.pipeline.unresolved;
        }
        if other.pipeline.top_n != PipelineConfig::default().top_n {
            self.pipeline.top_n = other.pipeline.top_n;
        }

        // Replace optional configs if provided
        if other.output.is_some() {
            self.output = other.output;
        }

        // Merge logging config
        if other.logging.level != LoggingConfig::default().level {
            self.logging.level = other.logging.level;
        }
        if other.logging.format != LoggingConfig::default().format {
            self.logging.format = other.logging.format;
        }
        if other.logging.timestamps != LoggingConfig::default().timestamps {
            self.logging.timestamps = other.logging.timestamps;
        }
    }

    /// Create an example configuration
    pub fn example() -> Self {
        Self {
            places_file: Some(PathBuf::from("data/places.sample.json")),
            playback: PlaybackConfig::default(),
            gazetteer: GazetteerConfig::default(),
            synthetic: SyntheticConfig {
                count: 250,
                window_days: 7,
                seed: Some(42),
            },
            dataset: DatasetConfig {
                alerts_file: Some(PathBuf::from("data/alerts.sample.json")),
                malformed: MalformedPolicy::Fail,
            },
            pipeline: PipelineConfig::default(),
            output: Some(OutputConfig {
                jsonl: Some(PathBuf::from("geopulse.out.jsonl")),
                compact: false,
            }),
            logging: LoggingConfig::default(),
        }
    }

    /// Generate example YAML configuration
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::example()).unwrap_or_default()
    }

    /// Generate example TOML configuration
    pub fn example_toml() -> String {
        toml::to_string_pretty(&Self::example()).unwrap_or_default()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(PathBuf, String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}
