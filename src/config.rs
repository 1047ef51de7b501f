//! Application configuration at `~/.config/daygrid/config.toml`.
//!
//! Every section is optional. `DAYGRID_WEATHER_API_KEY` and
//! `DAYGRID_DEFAULT_CITY` override the matching file values.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{CalendarError, CalendarResult};
use crate::theme::ThemeConfig;
use crate::weather::client::OPENWEATHER_BASE_URL;

const APP_DIR: &str = "daygrid";

pub const ENV_API_KEY: &str = "DAYGRID_WEATHER_API_KEY";
pub const ENV_DEFAULT_CITY: &str = "DAYGRID_DEFAULT_CITY";

fn default_base_url() -> String {
    OPENWEATHER_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_refresh_minutes() -> u64 {
    30
}

fn default_cache_minutes() -> i64 {
    30
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    /// Replaces the built-in default city until the user picks one.
    pub default_city: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u64,
    #[serde(default = "default_cache_minutes")]
    pub cache_minutes: i64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            refresh_minutes: default_refresh_minutes(),
            cache_minutes: default_cache_minutes(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Where events, tags, settings and the log file live.
    pub fn data_dir(&self) -> CalendarResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(expand_home(dir));
        }
        dirs::data_dir()
            .map(|d| d.join(APP_DIR))
            .ok_or_else(|| CalendarError::Config("Could not determine data directory".into()))
    }

    /// Where exports are written: configured dir, else Downloads, else cwd.
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .as_deref()
            .map(expand_home)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl AppConfig {
    pub fn config_path() -> CalendarResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalendarError::Config("Could not determine config directory".into()))?
            .join(APP_DIR);

        Ok(config_dir.join("config.toml"))
    }

    /// Read the config file (if any) and apply environment overrides.
    pub fn load() -> CalendarResult<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> CalendarResult<Self> {
        toml::from_str(content).map_err(|e| CalendarError::Config(format!("Invalid config.toml: {e}")))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(ENV_API_KEY) {
            self.weather.api_key = Some(key);
        }
        if let Some(city) = non_empty(ENV_DEFAULT_CITY) {
            self.weather.default_city = Some(city);
        }
    }
}
