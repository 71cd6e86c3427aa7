//! Checklist session use-case service.
//!
//! # Responsibility
//! - Own the session context (date, line, user, language) and filter state.
//! - Drive the engine from remote data and persist mutations through the API.
//! - Persist operator preferences whenever the context changes.
//!
//! # Invariants
//! - Precondition failures (`MissingUser`, `UnknownItem`, `NotChecked`) are
//!   returned before any network call.
//! - `load` leaves the previous working set in place when any fetch fails.
//! - A successful `submit` is always followed by a reload of the day.

use crate::api::{ApiError, ChecklistApi, PhotoUpload};
use crate::config::{normalize_line, ConfigError};
use crate::engine::options::FilterOptions;
use crate::engine::stats::ChecklistStats;
use crate::engine::summary::{summarize_day, summarize_range, CalendarSummary, DaySummary};
use crate::engine::visibility::ViewDates;
use crate::engine::{ChecklistEngine, EngineError, EnginePolicy};
use crate::export::csv::{export_file_name, to_csv_bytes};
use crate::model::completion::{DayKey, DayState, PhotoRef};
use crate::model::filter::FilterState;
use crate::model::item::{ChecklistItem, Lang};
use crate::model::schedule::ScheduleEntry;
use crate::prefs::{PreferenceStore, Preferences, PrefsError, LANG_KEY, LINE_KEY, USER_KEY};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ChecklistResult<T> = Result<T, ChecklistError>;

/// Service error for checklist use-cases.
#[derive(Debug)]
pub enum ChecklistError {
    /// Local precondition or catalog failure.
    Engine(EngineError),
    /// Remote call failure.
    Api(ApiError),
    /// Preference persistence failure.
    Prefs(PrefsError),
    /// Invalid context value such as a malformed line name.
    Config(ConfigError),
    /// Summary range with `start > end`.
    InvalidRange { start: NaiveDate, end: NaiveDate },
    /// Photo upload without file content.
    EmptyPhoto(String),
    /// Filter value the loaded catalog does not offer.
    UnknownFilter { selector: &'static str, value: String },
}

impl Display for ChecklistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Api(err) => write!(f, "{err}"),
            Self::Prefs(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::InvalidRange { start, end } => {
                write!(f, "invalid date range: {start} is after {end}")
            }
            Self::EmptyPhoto(filename) => write!(f, "photo `{filename}` is empty"),
            Self::UnknownFilter { selector, value } => {
                write!(f, "no {selector} `{value}` in the checklist catalog")
            }
        }
    }
}

impl Error for ChecklistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Api(err) => Some(err),
            Self::Prefs(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::InvalidRange { .. } | Self::EmptyPhoto(_) | Self::UnknownFilter { .. } => None,
        }
    }
}

impl From<EngineError> for ChecklistError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<ApiError> for ChecklistError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<PrefsError> for ChecklistError {
    fn from(value: PrefsError) -> Self {
        Self::Prefs(value)
    }
}

impl From<ConfigError> for ChecklistError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Active view of one operator session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub date: NaiveDate,
    pub line: String,
    /// Free-text operator name; blank means not entered yet.
    pub user: String,
    pub lang: Lang,
}

impl SessionContext {
    pub fn from_preferences(prefs: Preferences, date: NaiveDate) -> Self {
        Self {
            date,
            line: prefs.line,
            user: prefs.user,
            lang: prefs.lang,
        }
    }

    pub fn day_key(&self) -> DayKey {
        DayKey::new(self.date, self.line.clone())
    }

    fn require_user(&self) -> ChecklistResult<&str> {
        let user = self.user.trim();
        if user.is_empty() {
            return Err(EngineError::MissingUser.into());
        }
        Ok(user)
    }
}

/// Downloadable CSV of one day's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    /// UTF-8 with BOM.
    pub bytes: Vec<u8>,
}

/// Checklist session facade over an API client and a preference store.
pub struct ChecklistService<A: ChecklistApi, P: PreferenceStore> {
    api: A,
    prefs: P,
    context: SessionContext,
    filters: FilterState,
    engine: ChecklistEngine,
}

impl<A: ChecklistApi, P: PreferenceStore> ChecklistService<A, P> {
    /// Creates a session for `date`, seeding user, line and language from
    /// the preference store.
    pub fn new(api: A, prefs: P, date: NaiveDate, policy: EnginePolicy) -> ChecklistResult<Self> {
        let stored = Preferences::load(&prefs)?;
        Ok(Self {
            api,
            prefs,
            context: SessionContext::from_preferences(stored, date),
            filters: FilterState::default(),
            engine: ChecklistEngine::new(policy),
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn engine(&self) -> &ChecklistEngine {
        &self.engine
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Replaces the filters.
    ///
    /// Before the first `load` any selection is accepted and reconciled on
    /// load.
    ///
    /// # Errors
    /// - `UnknownFilter` when a selector names a value the loaded catalog does
    ///   not offer; the previous filters stay in place.
    pub fn set_filters(&mut self, filters: FilterState) -> ChecklistResult<()> {
        if self.engine.is_loaded() {
            if let Some((selector, value)) = self.engine.filter_options().first_unoffered(&filters) {
                warn!(
                    "event=filter_set module=service status=unknown_value selector={}",
                    selector
                );
                return Err(ChecklistError::UnknownFilter {
                    selector,
                    value: value.to_string(),
                });
            }
        }
        self.filters = filters;
        Ok(())
    }

    pub fn filter_options(&self) -> FilterOptions {
        self.engine.filter_options()
    }

    /// Fetches the catalog, then the last-completion index and the active
    /// day's state concurrently, and loads them into the engine.
    ///
    /// # Errors
    /// - `Engine(EmptyCatalog)` when the server has no items.
    /// - `Api(..)` when any fetch fails.
    pub async fn load(&mut self) -> ChecklistResult<()> {
        let items = self.api.fetch_items().await?;
        if items.is_empty() {
            warn!("event=checklist_load module=service status=empty_catalog");
            return Err(EngineError::EmptyCatalog.into());
        }

        let key = self.context.day_key();
        let (last_completions, state) = tokio::try_join!(
            self.api.fetch_last_completions(),
            self.api.fetch_day_state(&key)
        )?;

        self.engine.load(items, state, last_completions)?;
        self.engine.filter_options().reconcile(&mut self.filters);
        info!(
            "event=checklist_load module=service status=ok items={} records={}",
            self.engine.items().len(),
            self.engine.state().record_count()
        );
        Ok(())
    }

    /// Visible items for the active date in display order.
    pub fn visible_items(&self, today: NaiveDate) -> Vec<&ChecklistItem> {
        self.engine.visible_items(&self.filters, self.view_dates(today))
    }

    /// Statistics over the visible items.
    pub fn stats(&self, today: NaiveDate) -> ChecklistStats {
        let visible = self.visible_items(today);
        self.engine.stats(&visible, &self.context.user)
    }

    /// Due and check counts for the active day, computed from the loaded
    /// catalog and day state.
    pub fn day_summary(&self) -> DaySummary {
        let state = self.engine.state();
        let documents: Vec<&DayState> = if state.record_count() > 0 {
            vec![state]
        } else {
            Vec::new()
        };
        summarize_day(
            self.engine.items(),
            self.engine.last_completions(),
            self.context.date,
            &documents,
        )
    }

    /// Flips the active user's completion of `item_id` locally.
    ///
    /// Returns `true` when the item is now checked. Call `submit` to persist.
    pub fn toggle(&mut self, item_id: &str, note: Option<String>) -> ChecklistResult<bool> {
        let note = note.filter(|value| !value.trim().is_empty());
        Ok(self
            .engine
            .toggle(item_id, &self.context.user, note, Utc::now())?)
    }

    /// Replaces the note on the active user's record and persists at once.
    pub async fn edit_note(&mut self, item_id: &str, note: &str) -> ChecklistResult<()> {
        self.engine.edit_note(item_id, &self.context.user, note)?;
        self.submit().await
    }

    /// Stores the full day state remotely, then reloads the day.
    ///
    /// # Errors
    /// - `Engine(MissingUser)` before any request when no user is set.
    /// - `Api(Rejected)` when the server answers `success=false`.
    pub async fn submit(&mut self) -> ChecklistResult<()> {
        self.context.require_user()?;
        let key = self.context.day_key();
        self.api
            .submit_day_state(&key, self.engine.items(), self.engine.state())
            .await?;
        info!(
            "event=checklist_submit module=service status=ok records={}",
            self.engine.state().record_count()
        );
        self.load().await
    }

    /// Uploads one photo for `item_id` and attaches it to the active user's
    /// record.
    pub async fn upload_photo(
        &mut self,
        item_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ChecklistResult<PhotoRef> {
        let user = self.context.require_user()?.to_string();
        if self.engine.item(item_id).is_none() {
            return Err(EngineError::UnknownItem(item_id.to_string()).into());
        }
        if bytes.is_empty() {
            return Err(ChecklistError::EmptyPhoto(filename.to_string()));
        }

        let upload = PhotoUpload {
            day_key: self.context.day_key(),
            item_id: item_id.to_string(),
            user: user.clone(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            bytes,
        };
        let photo = self.api.upload_photo(&upload).await?;
        self.engine
            .attach_photo(item_id, &user, photo.clone(), Utc::now())?;
        info!(
            "event=photo_upload module=service status=ok item_id={} size_bytes={}",
            item_id,
            upload.bytes.len()
        );
        Ok(photo)
    }

    /// Fetches the active day's state fresh and renders it as CSV.
    pub async fn export_csv(&self) -> ChecklistResult<CsvExport> {
        let key = self.context.day_key();
        let state = self.api.fetch_day_state(&key).await?;
        let bytes = to_csv_bytes(&state, self.engine.items(), &self.context.line);
        info!(
            "event=csv_export module=service status=ok records={}",
            state.record_count()
        );
        Ok(CsvExport {
            file_name: export_file_name(&key.to_string()),
            bytes,
        })
    }

    /// Sets and persists the operator name.
    pub fn set_user(&mut self, user: &str) -> ChecklistResult<()> {
        let user = user.trim().to_string();
        self.prefs.set(USER_KEY, &user)?;
        self.context.user = user;
        Ok(())
    }

    /// Sets and persists the line. Call `load` to view the new line's day.
    pub fn set_line(&mut self, line: &str) -> ChecklistResult<()> {
        let line = normalize_line(line)?;
        self.prefs.set(LINE_KEY, &line)?;
        self.context.line = line;
        Ok(())
    }

    /// Sets and persists the display language.
    pub fn set_lang(&mut self, lang: Lang) -> ChecklistResult<()> {
        self.prefs.set(LANG_KEY, lang.code())?;
        self.context.lang = lang;
        Ok(())
    }

    /// Moves the session to another date. Call `load` afterwards.
    pub fn set_date(&mut self, date: NaiveDate) {
        self.context.date = date;
    }

    /// Schedule entry of the active (date, line), or an empty one.
    pub async fn fetch_schedule(&self) -> ChecklistResult<ScheduleEntry> {
        let entry = self
            .api
            .fetch_schedule(self.context.date, &self.context.line)
            .await?;
        Ok(entry.unwrap_or_else(|| ScheduleEntry::empty(self.context.date, self.context.line.clone())))
    }

    /// Stores `entry` for the active (date, line), stamped with the user.
    pub async fn save_schedule(&self, mut entry: ScheduleEntry) -> ChecklistResult<ScheduleEntry> {
        let user = self.context.require_user()?;
        entry.date = self.context.date;
        entry.line = self.context.line.clone();
        entry.updated_by = user.to_string();
        entry.updated_at = Some(Utc::now());

        self.api.save_schedule(&entry).await?;
        info!(
            "event=schedule_save module=service status=ok status_value={}",
            entry.status
        );
        Ok(entry)
    }

    /// Calendar summary over the inclusive range `[start, end]`.
    pub async fn calendar_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ChecklistResult<CalendarSummary> {
        if start > end {
            return Err(ChecklistError::InvalidRange { start, end });
        }
        Ok(self.api.fetch_calendar_summary(start, end).await?)
    }

    /// Calendar summary of the active line over `[start, end]`, computed
    /// locally from one day-state fetch per date.
    ///
    /// # Errors
    /// - `InvalidRange` when `start > end`.
    /// - `Engine(EmptyCatalog)` when nothing has been loaded.
    pub async fn local_calendar_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ChecklistResult<CalendarSummary> {
        if start > end {
            return Err(ChecklistError::InvalidRange { start, end });
        }
        if !self.engine.is_loaded() {
            return Err(EngineError::EmptyCatalog.into());
        }

        let mut documents = BTreeMap::new();
        for date in start.iter_days().take_while(|date| *date <= end) {
            let key = DayKey::new(date, self.context.line.clone());
            let state = self.api.fetch_day_state(&key).await?;
            if state.record_count() > 0 {
                documents.insert(date, vec![state]);
            }
        }
        info!(
            "event=calendar_summary module=service status=ok source=local days_with_records={}",
            documents.len()
        );
        Ok(summarize_range(
            self.engine.items(),
            self.engine.last_completions(),
            start,
            end,
            &documents,
        ))
    }

    fn view_dates(&self, today: NaiveDate) -> ViewDates {
        ViewDates {
            active: self.context.date,
            today,
        }
    }
}
