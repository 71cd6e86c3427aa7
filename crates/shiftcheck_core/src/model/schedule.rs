//! Per-line daily production schedule entry.
//!
//! Independent of the checklist engine; fetched and posted as a whole.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Production status of a line for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    /// Line runs as planned.
    #[default]
    Running,
    /// Planned production stop.
    PlannedStop,
    /// Line is down for maintenance.
    Maintenance,
    /// Model/material changeover.
    Changeover,
    /// No production scheduled.
    Idle,
}

impl LineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::PlannedStop => "planned_stop",
            Self::Maintenance => "maintenance",
            Self::Changeover => "changeover",
            Self::Idle => "idle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "running" => Some(Self::Running),
            "planned_stop" => Some(Self::PlannedStop),
            "maintenance" => Some(Self::Maintenance),
            "changeover" => Some(Self::Changeover),
            "idle" => Some(Self::Idle),
            _ => None,
        }
    }
}

impl Display for LineStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schedule entry for one (date, line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub line: String,
    #[serde(default)]
    pub status: LineStatus,
    /// Free-text production schedule.
    #[serde(default)]
    pub schedule: String,
    #[serde(default)]
    pub notes: String,
    /// Name of the operator who last edited the entry.
    #[serde(default)]
    pub updated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScheduleEntry {
    /// Creates an empty running entry for one (date, line).
    pub fn empty(date: NaiveDate, line: impl Into<String>) -> Self {
        Self {
            date,
            line: line.into(),
            status: LineStatus::Running,
            schedule: String::new(),
            notes: String::new(),
            updated_by: String::new(),
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LineStatus, ScheduleEntry};

    #[test]
    fn status_parses_snake_case_values() {
        assert_eq!(LineStatus::parse("Planned_Stop"), Some(LineStatus::PlannedStop));
        assert_eq!(LineStatus::parse("stopped"), None);
    }

    #[test]
    fn entry_decodes_with_defaults() {
        let entry: ScheduleEntry =
            serde_json::from_str(r#"{"date":"2024-03-01","line":"Line1"}"#).unwrap();
        assert_eq!(entry.status, LineStatus::Running);
        assert!(entry.schedule.is_empty());
    }
}
