//! CSV export of one day's completion records.
//!
//! # Invariants
//! - One row per (item, user) record, items and users in key order.
//! - Quoted fields escape embedded `"` by doubling it.
//! - `to_csv_bytes` output starts with a UTF-8 byte-order mark.

use crate::model::completion::DayState;
use crate::model::item::ChecklistItem;
use chrono::SecondsFormat;
use std::collections::HashMap;

pub const CSV_HEADER: &str = "item_id,item,line,user,checked,timestamp,note";
const UTF8_BOM: &str = "\u{feff}";
const UNKNOWN_LINE: &str = "Unknown";

/// Renders the day state as CSV text (no BOM).
pub fn day_state_to_csv(state: &DayState, items: &[ChecklistItem], line: &str) -> String {
    let descriptions: HashMap<&str, &str> = items
        .iter()
        .map(|item| (item.id.as_str(), item.description()))
        .collect();
    let line = if line.trim().is_empty() {
        UNKNOWN_LINE
    } else {
        line
    };

    let mut rows = vec![CSV_HEADER.to_string()];
    for (item_id, users) in &state.checked {
        let description = descriptions.get(item_id.as_str()).copied().unwrap_or("");
        for (user, record) in users {
            let timestamp = record
                .timestamp
                .map(|value| value.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default();
            let note = match record.note.as_deref() {
                Some(note) if !note.is_empty() => quote_field(note),
                _ => String::new(),
            };
            rows.push(format!(
                "{},{},{},{},{},{},{}",
                plain_field(item_id),
                quote_field(description),
                plain_field(line),
                plain_field(user),
                record.checked,
                timestamp,
                note
            ));
        }
    }
    rows.join("\n")
}

/// Renders the day state as downloadable bytes, BOM first.
pub fn to_csv_bytes(state: &DayState, items: &[ChecklistItem], line: &str) -> Vec<u8> {
    let mut content = String::from(UTF8_BOM);
    content.push_str(&day_state_to_csv(state, items, line));
    content.into_bytes()
}

/// Download file name for one (date, line) document key.
pub fn export_file_name(day_key: &str) -> String {
    format!("checklist_checked_{day_key}.csv")
}

/// Wraps a value in quotes, doubling embedded quotes.
pub fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Leaves simple values bare; quotes values containing separators.
fn plain_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        quote_field(value)
    } else {
        value.to_string()
    }
}
