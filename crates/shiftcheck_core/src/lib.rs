//! Core domain logic for the shift checklist client.
//! This crate is the single source of truth for checklist invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod export;
pub mod logging;
pub mod model;
pub mod prefs;
pub mod service;

pub use api::{ApiError, ApiResult, ChecklistApi, HttpChecklistApi, PhotoUpload};
pub use config::{ClientConfig, ConfigError};
pub use engine::options::FilterOptions;
pub use engine::stats::ChecklistStats;
pub use engine::summary::{CalendarSummary, DaySummary};
pub use engine::visibility::ViewDates;
pub use engine::{ChecklistEngine, EngineError, EnginePolicy, EngineResult, StatsScope};
pub use logging::{active_log_dir, default_log_level, init_logging, LoggingError};
pub use model::completion::{CompletionRecord, DayKey, DayState, LastCompletionIndex, PhotoRef};
pub use model::filter::{FilterState, Selector};
pub use model::item::{period_label, ChecklistItem, Lang};
pub use model::schedule::{LineStatus, ScheduleEntry};
pub use prefs::{PreferenceStore, Preferences, PrefsError, SqlitePreferenceStore};
pub use service::checklist_service::{
    ChecklistError, ChecklistResult, ChecklistService, CsvExport, SessionContext,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
