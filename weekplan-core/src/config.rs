//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/weekplan/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/weekplan/` (~/.config/weekplan/)
//! - Data: `$XDG_DATA_HOME/weekplan/` (~/.local/share/weekplan/)
//! - State/Logs: `$XDG_STATE_HOME/weekplan/` (~/.local/state/weekplan/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `calendar.access_token` is unset
pub const CALENDAR_TOKEN_ENV: &str = "WEEKPLAN_CALENDAR_TOKEN";

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
    /// Plan generation backend (optional; `generate` needs it)
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    /// Calendar export/import target
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Provider type
    pub provider: LlmProvider,
    /// Model to use
    pub model: String,
    /// API endpoint (optional, uses default for provider)
    pub endpoint: Option<String>,
    /// API key (can also use env var)
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Supported LLM providers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    Claude,
    OpenAI,
}

impl LlmProvider {
    /// Returns the default endpoint for this provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::Claude => "https://api.anthropic.com",
            LlmProvider::OpenAI => "https://api.openai.com",
        }
    }

    /// Environment variable holding the API key, if the provider needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            LlmProvider::Ollama => None,
            LlmProvider::Claude => Some("ANTHROPIC_API_KEY"),
            LlmProvider::OpenAI => Some("OPENAI_API_KEY"),
        }
    }
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_temperature() -> f32 {
    0.5
}

/// Calendar configuration
///
/// Exported events are created in `calendar_id` with start/end times in `time_zone`.
#[derive(Debug, Deserialize, Clone)]
pub struct CalendarConfig {
    /// Calendar API root (Google Calendar v3 by default)
    #[serde(default = "default_calendar_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// OAuth bearer token; falls back to `WEEKPLAN_CALENDAR_TOKEN`
    pub access_token: Option<String>,

    /// IANA zone name; falls back to `$TZ`, then UTC
    pub time_zone: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_calendar_timeout")]
    pub timeout_secs: u64,

    /// Pause before clearing the export progress display
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_calendar_base_url(),
            calendar_id: default_calendar_id(),
            access_token: None,
            time_zone: None,
            timeout_secs: default_calendar_timeout(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl CalendarConfig {
    /// Configured token, or the environment fallback
    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(CALENDAR_TOKEN_ENV).ok())
            .filter(|token| !token.trim().is_empty())
    }

    /// Resolve the configured zone name.
    pub fn time_zone(&self) -> Result<chrono_tz::Tz> {
        let name = self
            .time_zone
            .clone()
            .or_else(|| std::env::var("TZ").ok().filter(|tz| !tz.is_empty()))
            .unwrap_or_else(|| "UTC".to_string());

        name.parse::<chrono_tz::Tz>()
            .map_err(|e| Error::Config(format!("invalid calendar.time_zone {:?}: {}", name, e)))
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::Config(
                "calendar.api_base_url must not be empty".to_string(),
            ));
        }
        if self.calendar_id.trim().is_empty() {
            return Err(Error::Config(
                "calendar.calendar_id must not be empty".to_string(),
            ));
        }
        self.time_zone()?;
        Ok(())
    }

    pub fn settle_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_delay_ms)
    }
}

fn default_calendar_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_calendar_timeout() -> u64 {
    30
}

fn default_settle_delay_ms() -> u64 {
    2000
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
        config.calendar.validate()?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/weekplan/config.toml` (~/.config/weekplan/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("weekplan").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite store)
    ///
    /// `$XDG_DATA_HOME/weekplan/` (~/.local/share/weekplan/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("weekplan")
    }

    /// Returns the state directory path (for logs and locks)
    ///
    /// `$XDG_STATE_HOME/weekplan/` (~/.local/state/weekplan/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("weekplan")
    }

    /// Returns the store file path
    ///
    /// `$XDG_DATA_HOME/weekplan/store.db` (~/.local/share/weekplan/store.db)
    pub fn store_path() -> PathBuf {
        Self::data_dir().join("store.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/weekplan/weekplan.log` (~/.local/state/weekplan/weekplan.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("weekplan.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.llm.is_none());
        assert_eq!(
            config.calendar.api_base_url,
            "https://www.googleapis.com/calendar/v3"
        );
        assert_eq!(config.calendar.calendar_id, "primary");
        assert_eq!(config.calendar.timeout_secs, 30);
        assert_eq!(config.calendar.settle_delay_ms, 2000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"

[calendar]
calendar_id = "work@example.com"
time_zone = "America/New_York"
settle_delay_ms = 0

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        let llm = config.llm.unwrap();
        assert_eq!(llm.provider, LlmProvider::OpenAI);
        assert_eq!(llm.model, "gpt-4o-mini");
        assert_eq!(llm.timeout_secs, 60);
        assert_eq!(llm.max_tokens, 3000);
        assert!((llm.temperature - 0.5).abs() < f32::EPSILON);

        assert_eq!(config.calendar.calendar_id, "work@example.com");
        assert_eq!(
            config.calendar.time_zone().unwrap(),
            chrono_tz::America::New_York
        );
        assert_eq!(config.calendar.settle_delay(), std::time::Duration::ZERO);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_llm_provider_endpoints() {
        assert_eq!(
            LlmProvider::Ollama.default_endpoint(),
            "http://localhost:11434"
        );
        assert_eq!(
            LlmProvider::Claude.default_endpoint(),
            "https://api.anthropic.com"
        );
        assert_eq!(LlmProvider::Ollama.api_key_env(), None);
        assert_eq!(LlmProvider::OpenAI.api_key_env(), Some("OPENAI_API_KEY"));
    }

    #[test]
    fn test_calendar_rejects_unknown_time_zone() {
        let config = CalendarConfig {
            time_zone: Some("Mars/Olympus_Mons".to_string()),
            ..Default::default()
        };
        assert!(matches!(config.time_zone(), Err(Error::Config(_))));
        assert!(config.validate().is_err());

        let config = CalendarConfig {
            calendar_id: " ".to_string(),
            time_zone: Some("UTC".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[calendar]\ntime_zone = \"Europe/Berlin\"\naccess_token = \"tok\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.calendar.access_token().as_deref(), Some("tok"));
        assert_eq!(
            config.calendar.time_zone().unwrap(),
            chrono_tz::Europe::Berlin
        );

        std::fs::write(&path, "[calendar]\ntime_zone = \"Nowhere\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
