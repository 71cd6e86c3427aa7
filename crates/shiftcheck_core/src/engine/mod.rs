//! Checklist engine: ordering, filtering, recurrence gating and statistics.
//!
//! # Responsibility
//! - Hold the item catalog, the active day's completion state and the
//!   last-completion index for one session.
//! - Derive the visible, ordered list and its statistics on demand.
//! - Apply local toggle/note/photo mutations; persistence is the caller's job.
//!
//! # Invariants
//! - `load` rejects an empty catalog and leaves previous state untouched.
//! - Toggling on then off for the same (item, user) restores the previous
//!   completion map exactly.
//! - Mutations never touch records of other users.

pub mod options;
pub mod order;
pub mod stats;
pub mod summary;
pub mod visibility;

use crate::model::completion::{
    CompletionRecord, DayState, LastCompletionIndex, PhotoRef,
};
use crate::model::filter::FilterState;
use crate::model::item::{ChecklistItem, ItemId};
use chrono::{DateTime, Utc};
use log::debug;
use options::FilterOptions;
use stats::{compute_stats, ChecklistStats};
use std::error::Error;
use std::fmt::{Display, Formatter};
use visibility::{is_visible, ViewDates};

/// Category whose items sort ahead of all others.
pub const DEFAULT_CONSISTENCY_CATEGORY: &str = "정합성";
/// Equipment tag that passes every equipment selector.
pub const DEFAULT_COMMON_EQUIPMENT: &str = "공통";

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level failures. All are reported before any state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The item catalog is empty; the view cannot be built.
    EmptyCatalog,
    /// No active user name is set.
    MissingUser,
    /// The item id is not part of the loaded catalog.
    UnknownItem(ItemId),
    /// The user holds no record for the item.
    NotChecked { item_id: ItemId, user: String },
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "no checklist items found; load the item catalog first"),
            Self::MissingUser => write!(f, "enter your name before changing the checklist"),
            Self::UnknownItem(item_id) => write!(f, "unknown checklist item: {item_id}"),
            Self::NotChecked { item_id, user } => {
                write!(f, "item {item_id} is not checked by {user}; check it first")
            }
        }
    }
}

impl Error for EngineError {}

/// Which records count an item as checked in statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsScope {
    /// Any user's record counts.
    #[default]
    AnyUser,
    /// Only the active user's record counts.
    ActiveUser,
}

/// Canonical choice for each rule that diverged between deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnginePolicy {
    /// Sort the consistency category ahead of everything else.
    pub consistency_first: bool,
    /// Suppress not-yet-due periodic items on past dates.
    pub recurrence_gate: bool,
    pub stats_scope: StatsScope,
    pub consistency_category: String,
    pub common_equipment: String,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            consistency_first: true,
            recurrence_gate: true,
            stats_scope: StatsScope::AnyUser,
            consistency_category: DEFAULT_CONSISTENCY_CATEGORY.to_string(),
            common_equipment: DEFAULT_COMMON_EQUIPMENT.to_string(),
        }
    }
}

/// In-memory working set for one (date, line) view.
#[derive(Debug, Clone, Default)]
pub struct ChecklistEngine {
    policy: EnginePolicy,
    /// Catalog in the order it was loaded.
    items: Vec<ChecklistItem>,
    /// Indices into `items` in display order.
    display_order: Vec<usize>,
    state: DayState,
    last_completions: LastCompletionIndex,
}

impl ChecklistEngine {
    pub fn new(policy: EnginePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Replaces the working set.
    ///
    /// # Errors
    /// - `EmptyCatalog` when `items` is empty; current state is kept.
    pub fn load(
        &mut self,
        items: Vec<ChecklistItem>,
        state: DayState,
        last_completions: LastCompletionIndex,
    ) -> EngineResult<()> {
        if items.is_empty() {
            return Err(EngineError::EmptyCatalog);
        }

        self.display_order = order::display_order(&items, &self.policy);
        self.items = items;
        self.state = state;
        self.state.prune_empty();
        self.last_completions = last_completions;
        debug!(
            "event=engine_load module=engine status=ok items={} records={} last_completions={}",
            self.items.len(),
            self.state.record_count(),
            self.last_completions.len()
        );
        Ok(())
    }

    /// Returns whether a catalog has been loaded.
    pub fn is_loaded(&self) -> bool {
        !self.items.is_empty()
    }

    /// Catalog in load order.
    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    /// Catalog in display order.
    pub fn ordered_items(&self) -> impl Iterator<Item = &ChecklistItem> + '_ {
        self.display_order.iter().map(|&index| &self.items[index])
    }

    pub fn item(&self, item_id: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    pub fn state(&self) -> &DayState {
        &self.state
    }

    pub fn last_completions(&self) -> &LastCompletionIndex {
        &self.last_completions
    }

    /// Visible items in display order.
    pub fn visible_items(&self, filters: &FilterState, dates: ViewDates) -> Vec<&ChecklistItem> {
        self.ordered_items()
            .filter(|item| {
                is_visible(
                    item,
                    filters,
                    &self.state,
                    &self.last_completions,
                    dates,
                    &self.policy,
                )
            })
            .collect()
    }

    /// Statistics for an already-derived visible set.
    pub fn stats(&self, visible: &[&ChecklistItem], active_user: &str) -> ChecklistStats {
        compute_stats(visible, &self.state, self.policy.stats_scope, active_user)
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::from_items(&self.items)
    }

    /// Flips the (item, user) completion.
    ///
    /// Returns `true` when the item is now checked by `user`.
    ///
    /// # Errors
    /// - `MissingUser` when `user` is blank.
    /// - `UnknownItem` when `item_id` is not in the catalog.
    pub fn toggle(
        &mut self,
        item_id: &str,
        user: &str,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<bool> {
        let user = require_user(user)?;
        self.require_item(item_id)?;

        let users = self.state.checked.entry(item_id.to_string()).or_default();
        let now_checked = if users.remove(user).is_some() {
            false
        } else {
            users.insert(user.to_string(), CompletionRecord::checked_at(now, note));
            true
        };
        self.state.prune_empty();

        debug!(
            "event=item_toggle module=engine status=ok item_id={} checked={}",
            item_id, now_checked
        );
        Ok(now_checked)
    }

    /// Replaces the note on the user's record.
    ///
    /// # Errors
    /// - `MissingUser` when `user` is blank.
    /// - `NotChecked` when the user holds no record for the item.
    pub fn edit_note(&mut self, item_id: &str, user: &str, note: &str) -> EngineResult<()> {
        let user = require_user(user)?;
        let record = self
            .state
            .checked
            .get_mut(item_id)
            .and_then(|users| users.get_mut(user))
            .ok_or_else(|| EngineError::NotChecked {
                item_id: item_id.to_string(),
                user: user.to_string(),
            })?;

        record.note = if note.is_empty() {
            None
        } else {
            Some(note.to_string())
        };
        debug!(
            "event=note_edit module=engine status=ok item_id={} note_chars={}",
            item_id,
            note.chars().count()
        );
        Ok(())
    }

    /// Appends an uploaded photo to the user's record, creating a checked
    /// record when none exists.
    pub fn attach_photo(
        &mut self,
        item_id: &str,
        user: &str,
        photo: PhotoRef,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let user = require_user(user)?;
        self.require_item(item_id)?;

        self.state
            .checked
            .entry(item_id.to_string())
            .or_default()
            .entry(user.to_string())
            .or_insert_with(|| CompletionRecord::checked_at(now, None))
            .photos
            .push(photo);
        Ok(())
    }

    fn require_item(&self, item_id: &str) -> EngineResult<()> {
        if self.item(item_id).is_none() {
            return Err(EngineError::UnknownItem(item_id.to_string()));
        }
        Ok(())
    }
}

fn require_user(user: &str) -> EngineResult<&str> {
    let trimmed = user.trim();
    if trimmed.is_empty() {
        return Err(EngineError::MissingUser);
    }
    Ok(trimmed)
}
