//! Configuration management for TaskGuard
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.taskguard/config.toml

use crate::errors::{PolicyError, Result};
use crate::quality::QualityConfig;
use crate::recovery::{PatternMatcher, RecoveryConfig};
use crate::tools::{ToolDescriptor, WEB_SEARCH_CAPABILITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for TaskGuard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub recovery: RecoveryConfig,
    pub classifier: ClassifierConfig,
    pub quality: QualityConfig,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// AI provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Without a provider every AI path uses its local fallback
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub ai_enabled: bool,
}

/// Tools served by static discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub available: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { ai_enabled: true }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            available: vec![ToolDescriptor::fallback("web_search", &[WEB_SEARCH_CAPABILITY])],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PolicyError::ConfigError(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| PolicyError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// `~/.taskguard/config.toml`, when a home directory exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".taskguard").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ai.timeout_secs == 0 {
            return Err(PolicyError::ConfigError(
                "ai.timeout_secs must be greater than 0".to_string(),
            ));
        }

        let recovery = &self.recovery;
        if recovery.max_attempts_per_task == 0 {
            return Err(PolicyError::ConfigError(
                "recovery.max_attempts_per_task must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&recovery.confidence_threshold) {
            return Err(PolicyError::ConfigError(
                "recovery.confidence_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if recovery.history_capacity == 0 {
            return Err(PolicyError::ConfigError(
                "recovery.history_capacity must be at least 1".to_string(),
            ));
        }
        if recovery.base_retry_delay_secs.is_nan() || recovery.base_retry_delay_secs < 0.0 {
            return Err(PolicyError::ConfigError(
                "recovery.base_retry_delay_secs must not be negative".to_string(),
            ));
        }
        if recovery.max_backoff_secs.is_nan() || recovery.max_backoff_secs < 1.0 {
            return Err(PolicyError::ConfigError(
                "recovery.max_backoff_secs must be at least 1".to_string(),
            ));
        }
        // Compiles every configured pattern
        PatternMatcher::from_specs(&recovery.signatures)?;

        if self.quality.alert_history_capacity == 0 {
            return Err(PolicyError::ConfigError(
                "quality.alert_history_capacity must be at least 1".to_string(),
            ));
        }

        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(PolicyError::ConfigError(format!(
                    "Invalid log level: {}",
                    self.logging.level
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PolicyError::ConfigError(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| PolicyError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PolicyError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
