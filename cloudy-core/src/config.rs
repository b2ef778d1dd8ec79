use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    location::{DEFAULT_IP_LOOKUP_URL, Permission},
    model::{LocationFix, Units},
    provider::openweather::DEFAULT_BASE_URL,
};

pub const API_KEY_ENV: &str = "CLOUDY_API_KEY";
pub const BASE_URL_ENV: &str = "CLOUDY_BASE_URL";

/// Where automatic location fixes come from.
///
/// Example TOML:
/// [location.source]
/// kind = "fixed"
/// latitude = 52.52
/// longitude = 13.405
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LocationSourceConfig {
    Ip {
        #[serde(default = "default_ip_lookup_url")]
        url: String,
    },
    Fixed {
        latitude: f64,
        longitude: f64,
    },
}

impl Default for LocationSourceConfig {
    fn default() -> Self {
        LocationSourceConfig::Ip {
            url: default_ip_lookup_url(),
        }
    }
}

impl LocationSourceConfig {
    pub fn fixed(fix: LocationFix) -> Self {
        LocationSourceConfig::Fixed {
            latitude: fix.latitude,
            longitude: fix.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Unset until the user has answered the permission prompt once.
    #[serde(default)]
    pub permission: Option<Permission>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub source: LocationSourceConfig,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            permission: None,
            poll_interval_secs: default_poll_interval_secs(),
            source: LocationSourceConfig::default(),
        }
    }
}

impl LocationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather access credential.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub units: Units,

    #[serde(default)]
    pub location: LocationConfig,

    /// Environment values; used for requests but never written back to disk.
    #[serde(skip)]
    overrides: Overrides,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Overrides {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            units: Units::default(),
            location: LocationConfig::default(),
            overrides: Overrides::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_ip_lookup_url() -> String {
    DEFAULT_IP_LOOKUP_URL.to_string()
}

const fn default_poll_interval_secs() -> u64 {
    30
}

impl Config {
    /// Load config from the platform config dir and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_overrides(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Load config from `path`, or return an empty default if it doesn't exist yet.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to `path`, creating parent directories as needed.
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

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cloudy", "cloudy")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Credential and endpoint may come from the environment instead of the
    /// file. They take precedence over the file but are not saved.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.overrides = Overrides {
            api_key: lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()),
            base_url: lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()),
        };
    }

    /// Endpoint to query: the environment override, else the file value.
    pub fn effective_base_url(&self) -> &str {
        self.overrides.base_url.as_deref().unwrap_or(&self.base_url)
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.overrides
            .api_key
            .as_deref()
            .or(self.api_key.as_deref())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `cloudy configure` or set {API_KEY_ENV}."
                )
            })
    }
}
