//! Per-day calendar summary: due counts and check counts.
//!
//! # Invariants
//! - An item is due on a day unless it is periodic, was last completed
//!   strictly before that day, and fewer than `period_days` days have passed.
//! - `total_checked` counts each item at most once per day-state document.

use crate::model::completion::{DayState, LastCompletionIndex};
use crate::model::item::ChecklistItem;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Period bucket used for items missing from the catalog.
const UNKNOWN_PERIOD_KEY: &str = "0";

/// Summary of one calendar day across all lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    /// Whether any line stored a checklist for the day.
    #[serde(default)]
    pub submitted: bool,
    #[serde(default)]
    pub total_checked: usize,
    /// Checked item count per user.
    #[serde(default)]
    pub users: BTreeMap<String, usize>,
    #[serde(default)]
    pub total_due: usize,
    /// Checked item count per period key.
    #[serde(default)]
    pub period_checks: BTreeMap<String, usize>,
    /// Due item count per period key.
    #[serde(default)]
    pub period_due_counts: BTreeMap<String, usize>,
}

/// Response of the calendar summary endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    #[serde(default)]
    pub summary_data: BTreeMap<String, DaySummary>,
    #[serde(default)]
    pub total_master_items: usize,
}

/// Returns whether `item` counts as due on `date` for the calendar view.
pub fn is_due_on(item: &ChecklistItem, last_completions: &LastCompletionIndex, date: NaiveDate) -> bool {
    if !item.is_periodic() {
        return true;
    }
    match last_completions.get(&item.id) {
        Some(last) if *last < date => {
            let period_days = i64::from(item.period_days.unwrap_or(0));
            date.signed_duration_since(*last).num_days() >= period_days
        }
        _ => true,
    }
}

/// Due counts for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DueSummary {
    pub total_due: usize,
    pub period_due_counts: BTreeMap<String, usize>,
}

/// Counts items due on `date`, bucketed by period key.
pub fn due_summary(
    items: &[ChecklistItem],
    last_completions: &LastCompletionIndex,
    date: NaiveDate,
) -> DueSummary {
    let mut period_due_counts = BTreeMap::new();
    for item in items.iter().filter(|item| is_due_on(item, last_completions, date)) {
        *period_due_counts.entry(item.period_key()).or_default() += 1;
    }
    DueSummary {
        total_due: period_due_counts.values().sum(),
        period_due_counts,
    }
}

/// Summarizes one day from the catalog and that day's documents.
pub fn summarize_day(
    items: &[ChecklistItem],
    last_completions: &LastCompletionIndex,
    date: NaiveDate,
    documents: &[&DayState],
) -> DaySummary {
    let due = due_summary(items, last_completions, date);
    let mut summary = DaySummary {
        total_due: due.total_due,
        period_due_counts: due.period_due_counts,
        ..DaySummary::default()
    };

    let period_by_id: HashMap<&str, String> = items
        .iter()
        .map(|item| (item.id.as_str(), item.period_key()))
        .collect();

    summary.submitted = !documents.is_empty();
    for document in documents {
        for (item_id, users) in &document.checked {
            let Some((user, _)) = users.iter().find(|(_, record)| record.checked) else {
                continue;
            };
            summary.total_checked += 1;
            *summary.users.entry(user.clone()).or_default() += 1;
            let period_key = period_by_id
                .get(item_id.as_str())
                .cloned()
                .unwrap_or_else(|| UNKNOWN_PERIOD_KEY.to_string());
            *summary.period_checks.entry(period_key).or_default() += 1;
        }
    }

    summary
}

/// Summarizes every day in `[start, end]`, keyed by `YYYY-MM-DD`.
///
/// `documents` maps a date to all line documents stored for it.
pub fn summarize_range(
    items: &[ChecklistItem],
    last_completions: &LastCompletionIndex,
    start: NaiveDate,
    end: NaiveDate,
    documents: &BTreeMap<NaiveDate, Vec<DayState>>,
) -> CalendarSummary {
    let mut summary_data = BTreeMap::new();
    let mut current = start;
    while current <= end {
        let day_documents: Vec<&DayState> = documents
            .get(&current)
            .map(|states| states.iter().collect())
            .unwrap_or_default();
        summary_data.insert(
            current.format("%Y-%m-%d").to_string(),
            summarize_day(items, last_completions, current, &day_documents),
        );
        let Some(next) = current.succ_opt() else {
            break;
        };
        current = next;
    }

    CalendarSummary {
        summary_data,
        total_master_items: items.len(),
    }
}
