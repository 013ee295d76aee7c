use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{format::DailySampling, model::Units};

/// Environment variable that overrides the stored API key.
pub const API_KEY_ENV: &str = "SKYVIEW_API_KEY";

/// Provider endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Icon CDN template parts: `{base_url}/{size}/{code}.png`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub base_url: String,
    pub size: String,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openweathermap.org/img/wn".to_string(),
            size: "2x".to_string(),
        }
    }
}

impl IconConfig {
    pub fn url_for(&self, code: &str) -> String {
        format!("{}/{}/{}.png", self.base_url.trim_end_matches('/'), self.size, code)
    }
}

/// Startup values for the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub city: String,
    pub units: Units,
    pub sampling: DailySampling,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            city: crate::model::Query::DEFAULT_CITY.to_string(),
            units: Units::Metric,
            sampling: DailySampling::Stride,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// [provider]
/// base_url = "https://api.openweathermap.org/data/2.5"
/// [defaults]
/// city = "Paris"
/// units = "metric"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub provider: ProviderSettings,
    pub icons: IconConfig,
    pub defaults: Defaults,
}

/// Everything the orchestrator needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub icons: IconConfig,
    pub sampling: DailySampling,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skyview", "skyview")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Replace the stored key with `SKYVIEW_API_KEY` when it is set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
    }

    fn apply_api_key_override(&mut self, value: Option<String>) {
        if let Some(key) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Resolve the orchestrator configuration, failing when no API key is known.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `skyview configure` or set {API_KEY_ENV}."
                )
            })?;

        Ok(ClientConfig {
            api_key: api_key.to_string(),
            base_url: self.provider.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            icons: self.icons.clone(),
            sampling: self.defaults.sampling,
        })
    }
}
