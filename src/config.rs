//! Configuration loading for querychat
//!
//! Two TOML descriptors drive the process: the main `config.toml` read here
//! (database connection, model settings, paths, logging) and the table
//! definitions file owned by [`crate::schema::SchemaStore`].

use crate::pipeline::prompt::SamplingParams;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("failed to read config from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default = "default_console_output")]
    pub console_output: bool,
    #[serde(default)]
    pub file_output: bool,
    #[serde(default = "default_log_file_path")]
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            console_output: default_console_output(),
            file_output: false,
            file_path: default_log_file_path(),
        }
    }
}

/// Database connection descriptor
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            host: default_db_host(),
            port: default_db_port(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl DbConfig {
    /// Connection target with the password redacted, safe for log output
    pub fn display_url(&self) -> String {
        format!(
            "mysql://{}:****@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

/// Completion service settings, including per-mode sampling parameters
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the completion service
    pub base_url: String,

    /// Model name
    pub model: String,

    /// API key (can also use OPENAI_API_KEY env var)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Sampling for the per-intent draft mode (high randomness, not
    /// reproducible across restarts unless pinned down here)
    pub draft: SamplingParams,

    /// Sampling for the policy-constrained full-schema mode (low
    /// randomness, fixed seed for reproducibility)
    pub special: SamplingParams,

    /// Sampling for the correction pass
    pub correction: SamplingParams,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            request_timeout_secs: 60,
            draft: SamplingParams {
                temperature: 1.0,
                seed: None,
            },
            special: SamplingParams {
                temperature: 0.2,
                seed: Some(1),
            },
            correction: SamplingParams {
                temperature: 0.2,
                seed: Some(1),
            },
        }
    }
}

impl ModelConfig {
    /// API key from config or environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub db: DbConfig,

    pub model: ModelConfig,

    /// Timeout for a single query execution, in seconds
    pub query_timeout_secs: u64,

    /// Path to the table definitions file
    pub table_definitions_path: String,

    /// Path to the append-only session log
    pub session_log_path: String,

    /// User identifiers offered by the interactive surface
    pub users: Vec<String>,

    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db: DbConfig::default(),
            model: ModelConfig::default(),
            query_timeout_secs: 30,
            table_definitions_path: "config/table_definitions.toml".to_string(),
            session_log_path: "logs/qandquery.jsonl".to_string(),
            users: vec![
                "37001".to_string(),
                "37008".to_string(),
                "37031".to_string(),
            ],
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Configuration directory, `~/.config/querychat`
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".config").join("querychat"))
            .ok_or(ConfigError::NoHomeDirectory)
    }

    /// Default path of the main config file
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (mode, params) in [
            ("draft", &self.model.draft),
            ("special", &self.model.special),
            ("correction", &self.model.correction),
        ] {
            if !(0.0..=2.0).contains(&params.temperature) {
                return Err(ConfigError::Invalid(format!(
                    "{mode} temperature must be between 0.0 and 2.0"
                )));
            }
        }

        if self.model.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.query_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "query_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_console_output() -> bool {
    true
}

fn default_log_file_path() -> String {
    "logs/querychat.log".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    3306
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.db.port, 3306);
        assert_eq!(config.model.draft.temperature, 1.0);
        assert_eq!(config.model.draft.seed, None);
        assert_eq!(config.model.special.temperature, 0.2);
        assert_eq!(config.model.special.seed, Some(1));
        assert_eq!(config.query_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [db]
            host = "db.internal"
            database = "mandates"
            user = "reader"
            password = "secret"

            [model]
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(config.db.host, "db.internal");
        assert_eq!(config.db.port, 3306);
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.base_url, "https://api.openai.com/v1");
        assert_eq!(config.session_log_path, "logs/qandquery.jsonl");
    }

    #[test]
    fn sampling_overrides_are_not_hardcoded() {
        let config: Config = toml::from_str(
            r#"
            [model.special]
            temperature = 0.0
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.model.special.temperature, 0.0);
        assert_eq!(config.model.special.seed, Some(7));
        // the other modes keep their defaults
        assert_eq!(config.model.draft.temperature, 1.0);
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let mut config = Config::default();
        config.query_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_prefers_config_over_env() {
        let model = ModelConfig {
            api_key: Some("from-config".to_string()),
            ..ModelConfig::default()
        };
        assert_eq!(model.resolve_api_key(), Some("from-config".to_string()));
    }

    #[test]
    fn api_key_falls_back_to_env() {
        unsafe { env::set_var("OPENAI_API_KEY", "from-env") };
        let model = ModelConfig::default();
        assert_eq!(model.resolve_api_key(), Some("from-env".to_string()));
        unsafe { env::remove_var("OPENAI_API_KEY") };
    }

    #[test]
    fn display_url_redacts_password() {
        let db = DbConfig {
            host: "db.internal".to_string(),
            port: 3306,
            database: "mandates".to_string(),
            user: "reader".to_string(),
            password: "hunter2".to_string(),
        };
        let url = db.display_url();
        assert!(!url.contains("hunter2"));
        assert!(url.contains("reader"));
    }
}
