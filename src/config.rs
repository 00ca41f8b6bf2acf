use crate::error::{PipelineError, Result};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize)]
pub struct ScraperConfig {
    /// Channels to scrape, with or without the leading `@`.
    pub channels: Vec<String>,
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
    /// Per-channel fetch cursors survive restarts in this file.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_fetch_limit() -> usize {
    200
}

fn default_metadata_file() -> String {
    "channels_metadata.json".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file '{config_path}': {e}"))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}
