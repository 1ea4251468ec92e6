//! Server configuration.

use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use studio_core::{AppConfigFile, DEFAULT_MODEL};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// JSON file holding the API key and recent projects.
    #[serde(default = "default_app_config_path")]
    pub app_config_path: PathBuf,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_recent_projects")]
    pub max_recent_projects: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7860
}

fn default_app_config_path() -> PathBuf {
    AppConfigFile::default_path()
}

fn default_api_base_url() -> String {
    "https://api.stability.ai".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_recent_projects() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            app_config_path: default_app_config_path(),
            api_base_url: default_api_base_url(),
            default_model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            max_recent_projects: default_max_recent_projects(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from config/default.toml, or fall back to defaults.
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("config/default.toml");
        if config_path.exists() {
            return Self::load_from(&config_path);
        }
        Ok(Config::default())
    }
}
