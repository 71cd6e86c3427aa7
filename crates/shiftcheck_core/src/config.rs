//! Client configuration: defaults, environment overrides and validation.
//!
//! # Responsibility
//! - Resolve API base URL, preference-store path, log directory/level and
//!   request timeout.
//! - Validate values before any network or file-system work starts.
//!
//! # Invariants
//! - Precedence is defaults < environment < explicit setters (CLI flags).
//! - `validate` never touches the network or the file system.

use log::LevelFilter;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_BASE: &str = "SHIFTCHECK_API_BASE";
pub const ENV_PREFS_PATH: &str = "SHIFTCHECK_PREFS_PATH";
pub const ENV_LOG_DIR: &str = "SHIFTCHECK_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "SHIFTCHECK_LOG_LEVEL";
pub const ENV_TIMEOUT_SECS: &str = "SHIFTCHECK_TIMEOUT_SECS";

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;
const PREFS_FILE_NAME: &str = "shiftcheck_prefs.sqlite3";

static LINE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N} ._-]{0,63}$").expect("valid line regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidApiBase(String),
    InvalidTimeout(String),
    InvalidLogLevel(String),
    /// Log directory must be absolute.
    InvalidLogDir(String),
    InvalidLine(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidApiBase(value) => {
                write!(f, "api base must be an http(s) url, got `{value}`")
            }
            Self::InvalidTimeout(value) => write!(
                f,
                "timeout must be 1..={MAX_TIMEOUT_SECS} seconds, got `{value}`"
            ),
            Self::InvalidLogLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidLogDir(value) => {
                write!(f, "log dir must be an absolute path, got `{value}`")
            }
            Self::InvalidLine(value) => write!(f, "invalid line name `{value}`"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    /// `None` keeps preferences in memory only.
    pub prefs_path: Option<PathBuf>,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            prefs_path: default_prefs_path(),
            log_dir: None,
            log_level: crate::logging::default_log_level().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `SHIFTCHECK_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = non_blank(ENV_API_BASE) {
            config.api_base = value.trim().to_string();
        }
        if let Some(value) = non_blank(ENV_PREFS_PATH) {
            config.prefs_path = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = non_blank(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = non_blank(ENV_LOG_LEVEL) {
            config.log_level = value.trim().to_string();
        }
        if let Some(value) = non_blank(ENV_TIMEOUT_SECS) {
            config.timeout = parse_timeout(&value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks all fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api_base(&self.api_base)?;
        parse_log_level(&self.log_level)?;
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::InvalidLogDir(dir.display().to_string()));
            }
        }
        let secs = self.timeout.as_secs();
        if secs == 0 || secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout(secs.to_string()));
        }
        Ok(())
    }
}

/// Parses a timeout in whole seconds.
pub fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidTimeout(value.to_string()))?;
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::InvalidTimeout(value.to_string()));
    }
    Ok(Duration::from_secs(secs))
}

/// Validates and trims a production line name such as `Line1`.
pub fn normalize_line(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if !LINE_NAME_RE.is_match(trimmed) {
        return Err(ConfigError::InvalidLine(value.to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_api_base(value: &str) -> Result<(), ConfigError> {
    let lowered = value.trim().to_ascii_lowercase();
    let rest = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidApiBase(value.to_string())),
    }
}

/// Parses `trace|debug|info|warn|warning|error`, case-insensitive.
pub fn parse_log_level(value: &str) -> Result<LevelFilter, ConfigError> {
    let level = match value.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => return Err(ConfigError::InvalidLogLevel(value.to_string())),
    };
    Ok(level)
}

fn default_prefs_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    Some(PathBuf::from(home).join(".shiftcheck").join(PREFS_FILE_NAME))
}
