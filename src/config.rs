use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use streak_core::StreakConfig;

/// Contents of ~/.config/streak/config.toml. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Name of the calendar holding streak events
    pub calendar: Option<String>,

    /// Title of streak events
    pub event: Option<String>,

    /// Create the calendar if it doesn't exist yet
    #[serde(default)]
    pub create_calendar: bool,

    /// Where the Google OAuth session is cached
    pub token_cache: Option<String>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub calendar: Option<String>,
    pub event: Option<String>,
    pub create: bool,
    pub token_cache: Option<String>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug)]
pub struct Settings {
    pub streak: StreakConfig,
    pub session_path: PathBuf,
}

impl Config {
    pub fn settings(self, overrides: Overrides) -> Result<Settings> {
        let defaults = StreakConfig::default();

        let streak = StreakConfig {
            label: overrides.event.or(self.event).unwrap_or(defaults.label),
            calendar_name: overrides
                .calendar
                .or(self.calendar)
                .unwrap_or(defaults.calendar_name),
            create_if_missing: overrides.create || self.create_calendar,
        };

        let session_path = match overrides.token_cache.or(self.token_cache) {
            Some(path) => expand_path(&path),
            None => streak_provider_google::Session::default_path()?,
        };

        Ok(Settings {
            streak,
            session_path,
        })
    }
}

/// Get the config directory path (~/.config/streak)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("streak");
    Ok(config_dir)
}

/// Get the config file path (~/.config/streak/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from ~/.config/streak/config.toml, or defaults if it doesn't exist
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
