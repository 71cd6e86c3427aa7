//! Checklist item definitions.
//!
//! # Responsibility
//! - Define the catalog record served by `GET /checklist/items`.
//! - Provide render-time accessors that apply the `General` tag default.
//!
//! # Invariants
//! - `id` is unique within one catalog.
//! - Missing or empty tags are never rewritten at load time; accessors default
//!   them when read.

use serde::{Deserialize, Serialize};

/// Placeholder shown for missing process/equipment/category tags.
pub const GENERAL_TAG: &str = "General";
/// Period filter key for items without a recurrence period.
pub const CUSTOM_PERIOD_KEY: &str = "custom";

/// Stable identifier of one checklist item, e.g. `item_12`.
pub type ItemId = String;

/// Display language for item text and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lang {
    /// Korean (catalog default text).
    #[default]
    Kr,
    /// English.
    En,
}

impl Lang {
    /// Returns the preference-store code (`kr` | `en`).
    pub fn code(self) -> &'static str {
        match self {
            Self::Kr => "kr",
            Self::En => "en",
        }
    }

    /// Parses a preference-store code, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kr" | "ko" => Some(Self::Kr),
            "en" => Some(Self::En),
            _ => None,
        }
    }
}

/// One checklist task definition from the item catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ItemId,
    /// Default (Korean) task text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    /// English task text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_en: Option<String>,
    /// Legacy text field kept by older catalogs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    /// Equipment (vision type) tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Recurrence period in days. `None` means on-demand.
    #[serde(
        rename = "periodDays",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub period_days: Option<u32>,
    /// Explicit display order; treated as `0` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl ChecklistItem {
    /// Creates an item with only id and default text set.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item: Some(text.into()),
            item_en: None,
            text: None,
            process: None,
            equipment: None,
            category: None,
            period_days: None,
            order: None,
        }
    }

    /// Process tag, defaulted to [`GENERAL_TAG`].
    pub fn process_tag(&self) -> &str {
        tag_or_general(self.process.as_deref())
    }

    /// Equipment tag, defaulted to [`GENERAL_TAG`].
    pub fn equipment_tag(&self) -> &str {
        tag_or_general(self.equipment.as_deref())
    }

    /// Category tag, defaulted to [`GENERAL_TAG`].
    pub fn category_tag(&self) -> &str {
        tag_or_general(self.category.as_deref())
    }

    /// Period filter key: the period as a decimal string, or `custom`.
    pub fn period_key(&self) -> String {
        match self.period_days {
            Some(days) => days.to_string(),
            None => CUSTOM_PERIOD_KEY.to_string(),
        }
    }

    /// Returns whether recurrence gating applies to this item.
    pub fn is_periodic(&self) -> bool {
        matches!(self.period_days, Some(days) if days > 0)
    }

    /// Task text for the requested language.
    ///
    /// English falls back to the default text when `item_en` is blank.
    pub fn label(&self, lang: Lang) -> &str {
        if lang == Lang::En {
            if let Some(value) = non_blank(self.item_en.as_deref()) {
                return value;
            }
        }
        non_blank(self.item.as_deref())
            .or_else(|| non_blank(self.text.as_deref()))
            .unwrap_or("Task")
    }

    /// Description used by CSV export (default text, then legacy text).
    pub fn description(&self) -> &str {
        non_blank(self.item.as_deref())
            .or_else(|| non_blank(self.text.as_deref()))
            .unwrap_or("")
    }
}

/// Human-readable recurrence label.
pub fn period_label(period_days: Option<u32>, lang: Lang) -> String {
    match (period_days, lang) {
        (None | Some(0), _) => "As needed".to_string(),
        (Some(1), Lang::En) => "Daily".to_string(),
        (Some(1), Lang::Kr) => "매일".to_string(),
        (Some(7), Lang::En) => "Weekly".to_string(),
        (Some(7), Lang::Kr) => "주간".to_string(),
        (Some(30), Lang::En) => "Monthly".to_string(),
        (Some(30), Lang::Kr) => "월간".to_string(),
        (Some(days), Lang::En) => format!("Every {days} days"),
        (Some(days), Lang::Kr) => format!("{days}일 마다"),
    }
}

fn tag_or_general(value: Option<&str>) -> &str {
    match value {
        Some(tag) if !tag.is_empty() => tag,
        _ => GENERAL_TAG,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
