//! Remote checklist API contract.
//!
//! # Responsibility
//! - Describe the logical operations of the checklist HTTP API as a trait so
//!   the session service stays transport-agnostic.
//! - Define wire envelopes and the API error taxonomy.
//!
//! # Invariants
//! - Implementations never retry; a failed call surfaces as `ApiError`.
//! - `success=false` envelopes map to `ApiError::Rejected`.

pub mod http;

use crate::engine::summary::CalendarSummary;
use crate::model::completion::{CheckedMap, DayKey, DayState, LastCompletionIndex, PhotoRef};
use crate::model::item::ChecklistItem;
use crate::model::schedule::ScheduleEntry;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use http::HttpChecklistApi;

pub type ApiResult<T> = Result<T, ApiError>;

/// Network, protocol and server-side failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Base URL cannot be used to build requests.
    InvalidBaseUrl(String),
    /// Connection, timeout or body transfer failure.
    Transport(String),
    /// Non-success HTTP status with the server's message when present.
    Status { status: u16, message: String },
    /// Response body did not match the expected shape.
    Decode(String),
    /// Server answered `success=false`.
    Rejected(String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBaseUrl(value) => write!(f, "invalid API base url `{value}`"),
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
            Self::Rejected(message) => write!(f, "server rejected request: {message}"),
        }
    }
}

impl Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::Decode(value.to_string())
        } else {
            Self::Transport(value.to_string())
        }
    }
}

/// `GET /checklist/items` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
}

/// `GET /checklist/last-completions` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastCompletionsResponse {
    #[serde(default)]
    pub last_completions: BTreeMap<String, String>,
}

/// `POST /checklist` body: idempotent replace of one day's state.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest<'a> {
    pub date: String,
    pub items: &'a [ChecklistItem],
    pub checked: &'a CheckedMap,
}

/// Generic `{success, error?}` envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuccessEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SuccessEnvelope {
    /// Converts `success=false` into `ApiError::Rejected`.
    pub fn into_result(self, fallback: &str) -> ApiResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

/// `POST /checklist/upload-photo` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /schedule` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub entry: Option<ScheduleEntry>,
}

/// `GET /health` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
}

/// One photo upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub day_key: DayKey,
    pub item_id: String,
    pub user: String,
    /// Original file name, e.g. `lamp.jpg`.
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Logical operations of the remote checklist API.
#[async_trait]
pub trait ChecklistApi: Send + Sync {
    /// Fetches the item catalog.
    async fn fetch_items(&self) -> ApiResult<Vec<ChecklistItem>>;
    /// Fetches the last completion date per item across all days.
    async fn fetch_last_completions(&self) -> ApiResult<LastCompletionIndex>;
    /// Fetches the check state of one (date, line) document.
    async fn fetch_day_state(&self, key: &DayKey) -> ApiResult<DayState>;
    /// Replaces the check state of one (date, line) document.
    async fn submit_day_state(
        &self,
        key: &DayKey,
        items: &[ChecklistItem],
        state: &DayState,
    ) -> ApiResult<()>;
    /// Uploads one photo and returns its public reference.
    async fn upload_photo(&self, upload: &PhotoUpload) -> ApiResult<PhotoRef>;
    /// Fetches the schedule entry of one (date, line), if any.
    async fn fetch_schedule(&self, date: NaiveDate, line: &str) -> ApiResult<Option<ScheduleEntry>>;
    /// Stores one schedule entry.
    async fn save_schedule(&self, entry: &ScheduleEntry) -> ApiResult<()>;
    /// Fetches the per-day summary for an inclusive date range.
    async fn fetch_calendar_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ApiResult<CalendarSummary>;
    /// Returns the server health status string.
    async fn health(&self) -> ApiResult<String>;
}

/// Converts the raw `{itemId: "YYYY-MM-DD"}` map, dropping unparsable dates.
pub fn parse_last_completions(raw: BTreeMap<String, String>) -> LastCompletionIndex {
    let mut index = LastCompletionIndex::new();
    for (item_id, value) in raw {
        // Document ids may carry a `_<line>` suffix.
        let date_part = value.split('_').next().unwrap_or_default();
        match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            Ok(date) => {
                index.insert(item_id, date);
            }
            Err(_) => {
                warn!(
                    "event=last_completion_parse module=api status=skipped item_id={}",
                    item_id
                );
            }
        }
    }
    index
}
