//! Runtime settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `HSE_*` environment variables (`HSE_DATA_DIR`, `HSE_HOURS_WORKED`,
//! `HSE_WATCH_INTERVAL_MS`, `HSE_DEFAULT_WINDOW_DAYS`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::DEFAULT_HOURS_WORKED;
use crate::store::watcher::DEFAULT_POLL_INTERVAL;

/// Prefix of the environment variables read by [`HseConfig::load`].
pub const ENV_PREFIX: &str = "HSE";

/// Default reporting window, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Errors that can occur while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid settings: {0}")]
    Invalid(#[from] config::ConfigError),

    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Settings for the store, the metrics pipeline and the watcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HseConfig {
    /// Directory holding one `<domain key>.json` file per register.
    pub data_dir: PathBuf,
    /// Hours worked used by the rate KPIs.
    pub hours_worked: f64,
    /// Poll interval of the store watcher, in milliseconds.
    pub watch_interval_ms: u64,
    /// Length of the default reporting window, ending today.
    pub default_window_days: u32,
}

impl Default for HseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            hours_worked: DEFAULT_HOURS_WORKED,
            watch_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            default_window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

/// `<platform data dir>/hse`, or `.hse` when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("hse"))
        .unwrap_or_else(|| PathBuf::from(".hse"))
}

impl HseConfig {
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_hours_worked(mut self, hours_worked: f64) -> Self {
        self.hours_worked = hours_worked;
        self
    }

    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_default_window_days(mut self, days: u32) -> Self {
        self.default_window_days = days;
        self
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    /// Defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::layered(path, environment())
    }

    /// Defaults with environment overrides only.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::layered(None, environment())
    }

    fn layered(path: Option<&Path>, env: Environment) -> Result<Self, SettingsError> {
        let defaults = toml::to_string(&HseConfig::default())?;
        let mut builder = Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        if let Some(path) = path {
            if !path.exists() {
                return Err(SettingsError::NotFound(path.to_path_buf()));
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let settings = builder.add_source(env).build()?.try_deserialize::<HseConfig>()?;
        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }

    /// Render as TOML, suitable for a settings file.
    pub fn to_toml_string(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}
