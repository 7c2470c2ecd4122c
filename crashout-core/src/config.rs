//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/crashout/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/crashout/` (~/.config/crashout/)
//! - Data: `$XDG_DATA_HOME/crashout/` (~/.local/share/crashout/)
//! - State/Logs: `$XDG_STATE_HOME/crashout/` (~/.local/state/crashout/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Remote text generator (optional; absent means offline reactions)
    #[serde(default)]
    pub generator: Option<GeneratorConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote text generator configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    /// Provider type
    #[serde(default)]
    pub provider: GeneratorProvider,
    /// Model to use (defaults per provider)
    pub model: Option<String>,
    /// API endpoint (optional, uses default for provider)
    pub endpoint: Option<String>,
    /// API key (can also use env var)
    pub api_key: Option<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_generator_timeout")]
    pub timeout_secs: u64,
}

impl GeneratorConfig {
    /// A config for `provider` with every optional field left to defaults.
    pub fn for_provider(provider: GeneratorProvider) -> Self {
        Self {
            provider,
            model: None,
            endpoint: None,
            api_key: None,
            timeout_secs: default_generator_timeout(),
        }
    }

    /// Model name, falling back to the provider default.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Endpoint, falling back to the provider default.
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }

    /// Resolve the credential from config, then from the provider env vars.
    ///
    /// Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();
        self.api_key.clone().filter(present).or_else(|| {
            self.provider
                .api_key_env_vars()
                .iter()
                .find_map(|var| std::env::var(var).ok().filter(present))
        })
    }
}

fn default_generator_timeout() -> u64 {
    30
}

/// Supported text generator providers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorProvider {
    #[default]
    Gemini,
    OpenAI,
    Claude,
    Ollama,
}

impl GeneratorProvider {
    /// Returns the default endpoint for this provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            GeneratorProvider::Gemini => "https://generativelanguage.googleapis.com",
            GeneratorProvider::OpenAI => "https://api.openai.com",
            GeneratorProvider::Claude => "https://api.anthropic.com",
            GeneratorProvider::Ollama => "http://localhost:11434",
        }
    }

    /// Returns the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            GeneratorProvider::Gemini => "gemini-3-flash-preview",
            GeneratorProvider::OpenAI => "gpt-4o-mini",
            GeneratorProvider::Claude => "claude-3-5-haiku-latest",
            GeneratorProvider::Ollama => "llama3.2",
        }
    }

    /// Environment variables consulted when no `api_key` is configured
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            GeneratorProvider::Gemini => &["GEMINI_API_KEY", "GOOGLE_AI_KEY"],
            GeneratorProvider::OpenAI => &["OPENAI_API_KEY"],
            GeneratorProvider::Claude => &["ANTHROPIC_API_KEY"],
            GeneratorProvider::Ollama => &[],
        }
    }

    /// Whether this provider needs a credential at all
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, GeneratorProvider::Ollama)
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/crashout/config.toml` (~/.config/crashout/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("crashout").join("config.toml")
    }

    /// Returns the data directory path (for the snapshot database)
    ///
    /// `$XDG_DATA_HOME/crashout/` (~/.local/share/crashout/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("crashout")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/crashout/` (~/.local/state/crashout/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("crashout")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/crashout/crashout.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("crashout.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/crashout/crashout.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("crashout.log")
    }
}
