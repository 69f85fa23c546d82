use std::env;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Rounding boundary for the initial Start value and the minimum gap
    /// kept between Start and End. Must divide a whole hour.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    /// Initial distance between Start and End.
    #[serde(default = "default_span_minutes")]
    pub span_minutes: u32,
    #[serde(default = "default_use_24_hour_clock")]
    pub use_24_hour_clock: bool,
}

fn default_interval_minutes() -> u32 {
    15
}

fn default_span_minutes() -> u32 {
    60
}

fn default_use_24_hour_clock() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            span_minutes: default_span_minutes(),
            use_24_hour_clock: default_use_24_hour_clock(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_minutes == 0
            || self.interval_minutes > 60
            || 60 % self.interval_minutes != 0
        {
            return Err(ConfigError::InvalidInterval(self.interval_minutes));
        }

        if self.span_minutes < self.interval_minutes {
            return Err(ConfigError::InvalidSpan(self.span_minutes));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    TomlDecode(toml::de::Error),
    TomlEncode(toml::ser::Error),
    InvalidInterval(u32),
    InvalidSpan(u32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {err}"),
            ConfigError::TomlDecode(err) => write!(f, "failed to parse config: {err}"),
            ConfigError::TomlEncode(err) => write!(f, "failed to encode config: {err}"),
            ConfigError::InvalidInterval(minutes) => write!(
                f,
                "interval_minutes must be between 1 and 60 and divide a whole hour, got {minutes}"
            ),
            ConfigError::InvalidSpan(minutes) => write!(
                f,
                "span_minutes must be at least one interval, got {minutes}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(err) => return Err(ConfigError::Io(err)),
    };

    let config: Config = toml::from_str(&raw).map_err(ConfigError::TomlDecode)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
    }

    let encoded = toml::to_string_pretty(config).map_err(ConfigError::TomlEncode)?;
    fs::write(path, encoded).map_err(ConfigError::Io)
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    if let Some(path) = env::var_os("TIMESPAN_PICKER_CONFIG") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    config_dir().join(CONFIG_FILE)
}

fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(path) = env::var_os("APPDATA") {
            return PathBuf::from(path).join("timespan_picker");
        }
    }

    if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(path).join("timespan_picker");
    }

    if let Some(path) = env::var_os("HOME") {
        return PathBuf::from(path).join(".config").join("timespan_picker");
    }

    PathBuf::from(".timespan_picker")
}
