use crate::core::currency::CurrencyRecord;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_FRANKFURTER_URL: &str = "https://api.frankfurter.app";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FrankfurterProviderConfig {
    #[serde(default = "default_frankfurter_url")]
    pub base_url: String,
    /// Upper bound for a whole request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Extra attempts after a transport failure.
    #[serde(default)]
    pub retries: usize,
}

fn default_frankfurter_url() -> String {
    DEFAULT_FRANKFURTER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl Default for FrankfurterProviderConfig {
    fn default() -> Self {
        FrankfurterProviderConfig {
            base_url: default_frankfurter_url(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            retries: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub frankfurter: Option<FrankfurterProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            frankfurter: Some(FrankfurterProviderConfig::default()),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    /// Include underlying causes in error messages.
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub currencies: Vec<CurrencyRecord>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "pegfx", "pegfx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn frankfurter(&self) -> FrankfurterProviderConfig {
        self.providers.frankfurter.clone().unwrap_or_default()
    }
}
