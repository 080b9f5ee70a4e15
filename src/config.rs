//! Layered settings: defaults, then the TOML file, then `MENTORBOARD_*`
//! environment variables. Command line flags are applied by the binary.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub const DATABASE_URL_ENV: &str = "MENTORBOARD_DATABASE_URL";
pub const AUTH_TOKEN_ENV: &str = "MENTORBOARD_AUTH_TOKEN";
pub const THEME_ENV: &str = "MENTORBOARD_THEME";

const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_PATH: &str = "students";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Some(ThemeMode::Auto),
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Realtime Database root, e.g. `https://<project>-default-rtdb.firebaseio.com`
    pub database_url: Option<String>,
    /// Database secret or ID token, sent as the `auth` query parameter
    pub auth_token: Option<String>,
    /// Path holding the student records
    pub path: String,
    pub theme: ThemeMode,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            auth_token: None,
            path: DEFAULT_PATH.to_string(),
            theme: ThemeMode::Auto,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    InvalidValue { name: &'static str, value: String },
    MissingDatabaseUrl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, message } => {
                write!(f, "cannot read config {}: {message}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid config {}: {message}", path.display())
            }
            ConfigError::InvalidValue { name, value } => {
                write!(f, "invalid value for {name}: {value:?}")
            }
            ConfigError::MissingDatabaseUrl => write!(
                f,
                "no database URL configured; pass --database-url, set {DATABASE_URL_ENV} or add database_url to {CONFIG_FILE_NAME}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// `<config dir>/mentorboard/config.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mentorboard").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Loads the file at `explicit`, or the default file when it exists, then
    /// applies environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let config = toml::from_str(&raw).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(token) = lookup(AUTH_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.auth_token = Some(token);
        }
        if let Some(raw) = lookup(THEME_ENV) {
            self.theme = ThemeMode::parse(&raw).ok_or(ConfigError::InvalidValue {
                name: THEME_ENV,
                value: raw,
            })?;
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
