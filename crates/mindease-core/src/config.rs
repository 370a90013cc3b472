//! MindEase configuration loaded from TOML and environment.
//!
//! | Source | Example |
//! |--------|---------|
//! | defaults | see `MindEaseConfig::load` |
//! | `MINDEASE_CONFIG` or `config/mindease.toml` | `port = 5000` |
//! | env, prefix `MINDEASE`, separator `__` | `MINDEASE__PORT=8080` |
//! | `GEMINI_API_KEY` | API key when not set by the sources above |

use crate::genai::DEFAULT_GEMINI_BASE_URL;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/mindease";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MindEaseConfig {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    /// SQLite file holding conversations and thoughts.
    pub database_path: String,
    /// Directory served under `/static`; `index.html` and `chat.html` are read from here.
    pub static_dir: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub log_dir: Option<String>,
    pub gemini_base_url: String,
    /// Never serialized back out.
    #[serde(default, skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub classifier_model: String,
    pub responder_model: String,
    pub request_timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for MindEaseConfig {
    fn default() -> Self {
        Self {
            app_name: "MindEase".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: "./data/mindease.db".to_string(),
            static_dir: "./static".to_string(),
            log_dir: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_api_key: None,
            classifier_model: "gemini-2.5-pro".to_string(),
            responder_model: "gemini-2.5-flash".to_string(),
            request_timeout_secs: 60,
            retry_max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl MindEaseConfig {
    /// Load config from file and environment. Precedence: env > `MINDEASE_CONFIG` path (or
    /// `config/mindease.toml`) > defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("MINDEASE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut loaded = Self::load_from(&config_path)?;
        if loaded.gemini_api_key.is_none() {
            loaded.gemini_api_key = std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        Ok(loaded)
    }

    /// Same layering as [`load`](Self::load) with an explicit file path (extension optional).
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("app_name", defaults.app_name)?
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_path", defaults.database_path)?
            .set_default("static_dir", defaults.static_dir)?
            .set_default("gemini_base_url", defaults.gemini_base_url)?
            .set_default("classifier_model", defaults.classifier_model)?
            .set_default("responder_model", defaults.responder_model)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?
            .set_default("retry_max_attempts", i64::from(defaults.retry_max_attempts))?
            .set_default("retry_delay_ms", defaults.retry_delay_ms as i64)?;

        let path = Path::new(config_path);
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder.add_source(config::File::with_name(config_path).required(false))
        };

        builder
            .add_source(config::Environment::with_prefix("MINDEASE").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_delay_ms),
        )
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
