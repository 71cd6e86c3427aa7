//! File logging for the checklist client.
//!
//! Logging is opt-in: nothing is written to disk unless the resolved
//! [`ClientConfig`] names a log directory. Warnings and errors are mirrored
//! to stderr once a file logger is active.
//!
//! # Invariants
//! - At most one file logger per process. A second call with the same
//!   directory and level is a no-op; any other combination is rejected.
//! - Lines are `event=<name> module=<engine|service|api|db|cli> status=<..>`
//!   followed by ids and counts only. Operator names and note text stay out.

use crate::config::{parse_log_level, ClientConfig, ConfigError};
use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode,
};
use log::{info, LevelFilter};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "shiftcheck";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 3;

static ACTIVE_LOG: OnceCell<ActiveLog> = OnceCell::new();

struct ActiveLog {
    dir: PathBuf,
    level: LevelFilter,
    _handle: LoggerHandle,
}

#[derive(Debug)]
pub enum LoggingError {
    Config(ConfigError),
    /// Log directory could not be created.
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// A file logger with different settings is already running.
    AlreadyActive { dir: PathBuf, level: LevelFilter },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::CreateDir { dir, source } => {
                write!(f, "cannot create log dir `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "cannot start file logger: {err}"),
            Self::AlreadyActive { dir, level } => write!(
                f,
                "file logging already active at `{}` with level {level}",
                dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::AlreadyActive { .. } => None,
        }
    }
}

impl From<ConfigError> for LoggingError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Default level: `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Starts file logging when `config.log_dir` is set.
///
/// Returns `Ok(false)` when the config leaves file logging off.
pub fn init_logging(config: &ClientConfig) -> Result<bool, LoggingError> {
    let Some(dir) = config.log_dir.as_deref() else {
        return Ok(false);
    };
    if !dir.is_absolute() {
        return Err(ConfigError::InvalidLogDir(dir.display().to_string()).into());
    }
    let level = parse_log_level(&config.log_level)?;

    if let Some(active) = ACTIVE_LOG.get() {
        return ensure_same(active, dir, level).map(|()| true);
    }
    let active = ACTIVE_LOG.get_or_try_init(|| start_file_logger(dir, level))?;
    ensure_same(active, dir, level)?;
    Ok(true)
}

/// Directory of the running file logger, if any.
pub fn active_log_dir() -> Option<&'static Path> {
    ACTIVE_LOG.get().map(|active| active.dir.as_path())
}

fn start_file_logger(dir: &Path, level: LevelFilter) -> Result<ActiveLog, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let handle = Logger::try_with_str(level.as_str().to_ascii_lowercase())
        .map_err(LoggingError::Backend)?
        .log_to_file(
            FileSpec::default()
                .directory(dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .append()
        .write_mode(WriteMode::BufferAndFlush)
        .duplicate_to_stderr(Duplicate::Warn)
        .format_for_files(flexi_logger::detailed_format)
        .format_for_stderr(flexi_logger::default_format)
        .start()
        .map_err(LoggingError::Backend)?;

    info!(
        "event=log_start module=cli status=ok version={} level={} os={}",
        env!("CARGO_PKG_VERSION"),
        level,
        std::env::consts::OS
    );
    Ok(ActiveLog {
        dir: dir.to_path_buf(),
        level,
        _handle: handle,
    })
}

fn ensure_same(active: &ActiveLog, dir: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    if active.dir == dir && active.level == level {
        return Ok(());
    }
    Err(LoggingError::AlreadyActive {
        dir: active.dir.clone(),
        level: active.level,
    })
}
