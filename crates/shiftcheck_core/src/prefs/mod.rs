//! Client-side UI preferences behind a small key-value interface.
//!
//! # Responsibility
//! - Persist the operator name, line and display language between sessions.
//! - Keep storage details out of the session service.
//!
//! # Invariants
//! - Missing keys fall back to defaults: empty user, `Line1`, Korean.
//! - Unknown language codes read back as the default language.

pub mod sqlite_store;

use crate::db::DbError;
use crate::model::item::Lang;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use sqlite_store::SqlitePreferenceStore;

pub const USER_KEY: &str = "checklist_user";
pub const LINE_KEY: &str = "checklist_line";
pub const LANG_KEY: &str = "checklist_lang";
pub const DEFAULT_LINE: &str = "Line1";

pub type PrefsResult<T> = Result<T, PrefsError>;

#[derive(Debug)]
pub enum PrefsError {
    Db(DbError),
    /// Keys must be non-blank.
    InvalidKey(String),
}

impl Display for PrefsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidKey(key) => write!(f, "invalid preference key `{key}`"),
        }
    }
}

impl Error for PrefsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) => None,
        }
    }
}

impl From<DbError> for PrefsError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PrefsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value preference storage.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> PrefsResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PrefsResult<()>;
    fn remove(&self, key: &str) -> PrefsResult<()>;
}

/// Typed view over the three persisted preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub user: String,
    pub line: String,
    pub lang: Lang,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            user: String::new(),
            line: DEFAULT_LINE.to_string(),
            lang: Lang::Kr,
        }
    }
}

impl Preferences {
    /// Reads preferences, applying defaults for missing values.
    pub fn load(store: &impl PreferenceStore) -> PrefsResult<Self> {
        let defaults = Self::default();
        let user = store
            .get(USER_KEY)?
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.user);
        let line = store
            .get(LINE_KEY)?
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.line);
        let lang = store
            .get(LANG_KEY)?
            .and_then(|value| Lang::parse(&value))
            .unwrap_or(defaults.lang);
        Ok(Self { user, line, lang })
    }

    /// Writes all three preferences.
    pub fn save(&self, store: &impl PreferenceStore) -> PrefsResult<()> {
        store.set(USER_KEY, self.user.trim())?;
        store.set(LINE_KEY, &self.line)?;
        store.set(LANG_KEY, self.lang.code())
    }
}
