//! Completion records and per-day checklist state.
//!
//! # Responsibility
//! - Define one user's check-in for one item on one day.
//! - Define the per-(date, line) document exchanged with the API.
//!
//! # Invariants
//! - `DayState::checked` never holds an item entry with zero users.
//! - Records are keyed by (item id, user name); several users may hold a
//!   record for the same item on the same day.

use crate::model::item::ItemId;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Free-text operator name used as the record key.
pub type UserName = String;

/// Per-item map of user name to that user's record.
pub type ItemCompletions = BTreeMap<UserName, CompletionRecord>;

/// Full check state of one day: item id -> user -> record.
pub type CheckedMap = BTreeMap<ItemId, ItemCompletions>;

/// Item id -> most recent date (any user) the item was completed.
pub type LastCompletionIndex = BTreeMap<ItemId, NaiveDate>;

/// Reference to one uploaded photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRef {
    pub url: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
}

/// One user's check-in for one item on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    /// Instant the item was marked done.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default = "default_checked")]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<PhotoRef>,
}

impl CompletionRecord {
    /// Creates a checked record stamped at `now`.
    pub fn checked_at(now: DateTime<Utc>, note: Option<String>) -> Self {
        Self {
            timestamp: Some(now),
            checked: true,
            note: note.filter(|value| !value.is_empty()),
            photos: Vec::new(),
        }
    }
}

fn default_checked() -> bool {
    true
}

/// Parses RFC 3339, or a naive ISO date-time read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// Non-string or unparseable values decode as `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

/// Document key for one day on one line, rendered as `YYYY-MM-DD_<line>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DayKey {
    pub date: NaiveDate,
    pub line: String,
}

impl DayKey {
    pub fn new(date: NaiveDate, line: impl Into<String>) -> Self {
        Self {
            date,
            line: line.into(),
        }
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.date.format("%Y-%m-%d"), self.line)
    }
}

/// Check state of one (date, line) document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayState {
    #[serde(default)]
    pub checked: CheckedMap,
}

impl DayState {
    /// Returns whether any user holds a record for `item_id`.
    pub fn is_checked(&self, item_id: &str) -> bool {
        self.checked
            .get(item_id)
            .is_some_and(|users| !users.is_empty())
    }

    /// Returns whether `user` holds a record for `item_id`.
    pub fn is_checked_by(&self, item_id: &str, user: &str) -> bool {
        self.record(item_id, user).is_some()
    }

    /// Returns one user's record for an item.
    pub fn record(&self, item_id: &str, user: &str) -> Option<&CompletionRecord> {
        self.checked.get(item_id).and_then(|users| users.get(user))
    }

    /// Returns all photos attached to an item across users.
    pub fn photos_for(&self, item_id: &str) -> Vec<&PhotoRef> {
        self.checked
            .get(item_id)
            .map(|users| users.values().flat_map(|record| &record.photos).collect())
            .unwrap_or_default()
    }

    /// Number of (item, user) records.
    pub fn record_count(&self) -> usize {
        self.checked.values().map(BTreeMap::len).sum()
    }

    /// Drops item entries left without users.
    pub(crate) fn prune_empty(&mut self) {
        self.checked.retain(|_, users| !users.is_empty());
    }
}
