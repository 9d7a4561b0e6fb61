use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::generator::canned::{DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};
use crate::provider::GeneratorKind;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3:latest";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub generator: Option<String>,
    pub model: Option<String>,
    pub ollama_url: Option<String>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            generator: Some(GeneratorKind::Canned.as_str().to_string()),
            ..Self::default()
        }
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {:?}: {}", path, e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("sparkchat").join("config.json"))
    }

    /// Apply environment overrides (`OLLAMA_HOST`)
    pub fn with_env(mut self) -> Self {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            if !host.trim().is_empty() {
                self.ollama_url = Some(normalize_host(&host));
            }
        }
        self
    }

    pub fn generator_kind(&self) -> GeneratorKind {
        self.generator
            .as_deref()
            .and_then(GeneratorKind::from_str)
            .unwrap_or(GeneratorKind::Canned)
    }

    pub fn model(&self) -> String {
        self.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn ollama_url(&self) -> String {
        self.ollama_url
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
    }

    pub fn log_level(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    }

    /// Thinking delay for the canned generator. An inverted range collapses to its minimum.
    pub fn delay_range(&self) -> Range<Duration> {
        let min = self
            .min_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MIN_DELAY);
        let max = self
            .max_delay_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MAX_DELAY);
        min..max.max(min)
    }
}

/// OLLAMA_HOST is often given without a scheme ("127.0.0.1:11434")
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
