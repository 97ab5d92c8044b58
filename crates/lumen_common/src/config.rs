//! Configuration for lumen.
//!
//! Loads `$LUMEN_CONFIG`, then `$XDG_CONFIG_HOME/lumen/config.toml`, falling
//! back to defaults. Every field has a serde default so partial files work.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "LUMEN_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to write config: {0}")]
    Write(String),
}

// ============================================================================
// Sections
// ============================================================================

/// Local classifier model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Tokens allowed for a yes/no or brief/detailed verdict
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_endpoint() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_llm_model() -> String {
    "qwen2.5:0.5b-instruct".to_string()
}

fn default_llm_timeout() -> u64 {
    4
}

fn default_llm_max_tokens() -> u32 {
    8
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

/// Web search backend and quota
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_monthly_limit")]
    pub monthly_limit: u32,

    #[serde(default = "default_result_count")]
    pub result_count: u32,

    /// Freshness filter passed to the backend ("pd", "pw", "pm" or empty)
    #[serde(default)]
    pub freshness: Option<String>,

    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_search_endpoint() -> String {
    "https://api.search.brave.com/res/v1/web/search".to_string()
}

fn default_monthly_limit() -> u32 {
    crate::settings::DEFAULT_MONTHLY_LIMIT
}

fn default_result_count() -> u32 {
    10
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_search_timeout() -> u64 {
    8
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            monthly_limit: default_monthly_limit(),
            result_count: default_result_count(),
            freshness: None,
            min_interval_ms: default_min_interval_ms(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl SearchConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Provider result cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_ttl_secs() -> u64 {
    crate::cache::DEFAULT_TTL.as_secs()
}

fn default_capacity() -> usize {
    crate::cache::DEFAULT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            capacity: default_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Output caps for injected context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterConfig {
    #[serde(default = "default_brief_cap")]
    pub brief_cap: usize,

    #[serde(default = "default_detailed_cap")]
    pub detailed_cap: usize,
}

fn default_brief_cap() -> usize {
    500
}

fn default_detailed_cap() -> usize {
    1200
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            brief_cap: default_brief_cap(),
            detailed_cap: default_detailed_cap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_use_celsius")]
    pub use_celsius: bool,

    /// Used when a weather query names no place
    #[serde(default)]
    pub default_location: Option<String>,

    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

fn default_use_celsius() -> bool {
    true
}

fn default_forecast_days() -> u32 {
    3
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            use_celsius: default_use_celsius(),
            default_location: None,
            forecast_days: default_forecast_days(),
        }
    }
}

/// On-disk state owned by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,

    #[serde(default = "default_agenda_file")]
    pub agenda_file: PathBuf,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lumen")
}

fn default_settings_file() -> PathBuf {
    data_dir().join("settings.json")
}

fn default_agenda_file() -> PathBuf {
    data_dir().join("agenda.json")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            settings_file: default_settings_file(),
            agenda_file: default_agenda_file(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LumenConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub formatter: FormatterConfig,

    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub paths: PathsConfig,
}

impl LumenConfig {
    /// Config file candidates in lookup order
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            if !explicit.trim().is_empty() {
                paths.push(PathBuf::from(explicit));
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("lumen").join("config.toml"));
        }
        paths
    }

    /// Load from the first readable candidate, else defaults
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from_path(&path) {
                Ok(config) => return config,
                Err(e) => warn!("Ignoring config: {}", e),
            }
        }
        warn!("No config file found, using defaults");
        Self::default()
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the defaults out (for `lumenctl config init`)
    pub fn save_default(path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| ConfigError::Write(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }
        fs::write(path, content).map_err(|e| ConfigError::Write(e.to_string()))?;
        info!("Saved default config to {}", path.display());
        Ok(())
    }
}
