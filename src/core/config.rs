use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::client::validate_endpoint;
use crate::core::cost::pricing;
use crate::core::rollup::{DEFAULT_ITEMS_PER_PAGE, ITEMS_PER_PAGE_OPTIONS};
use crate::core::series::ChartWindow;

pub const ENV_API_URL: &str = "ZU_API_URL";
pub const ENV_API_TOKEN: &str = "ZU_API_TOKEN";
pub const ENV_BOT_NAME: &str = "ZU_BOT_NAME";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token for the admin endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_format")]
    pub default_format: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_days")]
    pub default_days: u32,
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
    /// Pricing row for `zu estimate` when the backend setting is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_format() -> String {
    "text".to_string()
}
fn default_color() -> String {
    "auto".to_string()
}
fn default_days() -> u32 {
    ChartWindow::default().days()
}
fn default_items_per_page() -> usize {
    DEFAULT_ITEMS_PER_PAGE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            color: default_color(),
            default_days: default_days(),
            items_per_page: default_items_per_page(),
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Assistant name shown in dashboard headings.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub settings: Settings,
}

fn default_bot_name() -> String {
    "Zygotrix AI".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            api: ApiConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("zu").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not
    /// found, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay `ZU_*` variables. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api.token = Some(token);
        }
        if let Some(name) = get(ENV_BOT_NAME) {
            self.bot_name = name;
        }
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn window(&self) -> ChartWindow {
        ChartWindow::from_days(self.settings.default_days).unwrap_or_default()
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !["text", "json"].contains(&self.settings.default_format.as_str()) {
            issues.push(format!(
                "Invalid default_format: '{}' (must be 'text' or 'json')",
                self.settings.default_format
            ));
        }
        if !["auto", "always", "never"].contains(&self.settings.color.as_str()) {
            issues.push(format!(
                "Invalid color: '{}' (must be 'auto', 'always', or 'never')",
                self.settings.color
            ));
        }
        if ChartWindow::from_days(self.settings.default_days).is_none() {
            issues.push(format!(
                "Invalid default_days: {} (must be 7, 14, 30, 60 or 90)",
                self.settings.default_days
            ));
        }
        if !ITEMS_PER_PAGE_OPTIONS.contains(&self.settings.items_per_page) {
            issues.push(format!(
                "Invalid items_per_page: {} (must be 5, 10, 25 or 50)",
                self.settings.items_per_page
            ));
        }
        if let Err(e) = validate_endpoint(&self.api.base_url) {
            issues.push(format!("Invalid api.base_url: {}", e));
        }
        if let Some(model) = &self.settings.model {
            if pricing::lookup(model).is_none() {
                issues.push(format!(
                    "Unknown model: '{}' (default pricing will be used)",
                    model
                ));
            }
        }
        issues
    }
}
