//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which dates form the "universe" of the co-occurrence contingency table
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CooccurrenceUniverse {
    /// Only dates on which at least one of the two habits was completed
    /// (the "neither" cell is always 0)
    #[default]
    Union,
    /// Every calendar day between the first and last completion of either habit
    Span,
}

/// Thresholds of the relation analyzer and chain discovery
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Completed checkins each habit needs before a relation is inferred
    #[serde(default = "default_min_completions")]
    pub min_completions: usize,

    /// Upper bound of the mean source->target delay for a trigger (ms)
    #[serde(default = "default_trigger_window_ms")]
    pub trigger_window_ms: i64,

    #[serde(default = "default_max_trigger_confidence")]
    pub max_trigger_confidence: f64,

    #[serde(default = "default_same_day_threshold")]
    pub same_day_threshold: f64,

    #[serde(default = "default_complementary_phi")]
    pub complementary_phi: f64,

    #[serde(default = "default_conflicting_phi")]
    pub conflicting_phi: f64,

    /// Relations at or below this confidence never become chain edges
    #[serde(default = "default_chain_min_confidence")]
    pub chain_min_confidence: f64,

    #[serde(default = "default_min_chain_length")]
    pub min_chain_length: usize,

    #[serde(default = "default_max_chain_length")]
    pub max_chain_length: usize,

    /// Trigger-path search stops after this many chains are emitted
    #[serde(default = "default_max_trigger_chains")]
    pub max_trigger_chains: usize,

    /// Interior trigger-chain habits are optional when both adjacent edges
    /// fall below this confidence
    #[serde(default = "default_optional_edge_threshold")]
    pub optional_edge_threshold: f64,

    #[serde(default)]
    pub universe: CooccurrenceUniverse,

    /// Analyze habit pairs on the rayon thread pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_min_completions() -> usize {
    5
}

fn default_trigger_window_ms() -> i64 {
    60 * 60 * 1000 // 1 hour
}

fn default_max_trigger_confidence() -> f64 {
    0.9
}

fn default_same_day_threshold() -> f64 {
    0.7
}

fn default_complementary_phi() -> f64 {
    0.5
}

fn default_conflicting_phi() -> f64 {
    -0.3
}

fn default_chain_min_confidence() -> f64 {
    0.5
}

fn default_min_chain_length() -> usize {
    3
}

fn default_max_chain_length() -> usize {
    8
}

fn default_max_trigger_chains() -> usize {
    1000
}

fn default_optional_edge_threshold() -> f64 {
    0.7
}

fn default_parallel() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_completions: default_min_completions(),
            trigger_window_ms: default_trigger_window_ms(),
            max_trigger_confidence: default_max_trigger_confidence(),
            same_day_threshold: default_same_day_threshold(),
            complementary_phi: default_complementary_phi(),
            conflicting_phi: default_conflicting_phi(),
            chain_min_confidence: default_chain_min_confidence(),
            min_chain_length: default_min_chain_length(),
            max_chain_length: default_max_chain_length(),
            max_trigger_chains: default_max_trigger_chains(),
            optional_edge_threshold: default_optional_edge_threshold(),
            universe: CooccurrenceUniverse::default(),
            parallel: default_parallel(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("habitlink").join("config.toml")),
            Some(PathBuf::from("/etc/habitlink/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Analysis overrides
        if let Ok(max) = std::env::var("HABITLINK_MAX_CHAIN_LENGTH") {
            if let Ok(n) = max.parse() {
                self.analysis.max_chain_length = n;
            }
        }
        if let Ok(parallel) = std::env::var("HABITLINK_PARALLEL") {
            if let Ok(flag) = parallel.parse() {
                self.analysis.parallel = flag;
            }
        }

        // Logging overrides
        if let Ok(level) = std::env::var("HABITLINK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("HABITLINK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Habitlink Configuration
#
# Environment variables override these settings:
# - HABITLINK_MAX_CHAIN_LENGTH
# - HABITLINK_PARALLEL
# - HABITLINK_LOG_LEVEL
# - HABITLINK_LOG_FORMAT

[analysis]
# Completed checkins each habit needs before relations are inferred
min_completions = 5

# Mean delay (ms) under which a source habit counts as a trigger
trigger_window_ms = 3600000

# Cap on trigger confidence
max_trigger_confidence = 0.9

# Same-day rate above which two habits are sequential
same_day_threshold = 0.7

# Phi coefficient bounds for complementary / conflicting habits
complementary_phi = 0.5
conflicting_phi = -0.3

# Minimum relation confidence for chain edges
chain_min_confidence = 0.5

# Chain length bounds
min_chain_length = 3
max_chain_length = 8

# Stop searching for trigger chains after this many are found
max_trigger_chains = 1000

# Interior habits become optional when both adjacent edges are below this
optional_edge_threshold = 0.7

# Co-occurrence date universe: union or span
universe = "union"

# Analyze habit pairs in parallel
parallel = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_template_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        let defaults = AnalysisConfig::default();

        assert_eq!(config.analysis.min_completions, defaults.min_completions);
        assert_eq!(config.analysis.trigger_window_ms, defaults.trigger_window_ms);
        assert_eq!(config.analysis.max_chain_length, 8);
        assert_eq!(config.analysis.max_trigger_chains, defaults.max_trigger_chains);
        assert_eq!(config.analysis.universe, CooccurrenceUniverse::Union);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse("[analysis]\nuniverse = \"span\"\n").unwrap();

        assert_eq!(config.analysis.universe, CooccurrenceUniverse::Span);
        assert_eq!(config.analysis.min_chain_length, 3);
        assert!(config.analysis.parallel);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nmax_chain_length = 4\n\n[logging]\nformat = \"json\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.analysis.max_chain_length, 4);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/habitlink.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nmax_chain_length = \"many\"").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
