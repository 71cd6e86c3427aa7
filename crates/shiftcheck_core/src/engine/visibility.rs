//! Filter predicate and recurrence gating.
//!
//! # Invariants
//! - An item is visible iff it passes all four selectors and, when the
//!   recurrence gate is enabled, is due for the active date.
//! - Items tagged with the common equipment value pass any equipment selector.
//! - The recurrence gate only applies to strictly past dates without a record
//!   for the item.

use crate::engine::EnginePolicy;
use crate::model::completion::{DayState, LastCompletionIndex};
use crate::model::filter::FilterState;
use crate::model::item::ChecklistItem;
use chrono::NaiveDate;

/// Dates the visibility rules are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDates {
    /// Date whose checklist is being viewed.
    pub active: NaiveDate,
    /// The actual present day.
    pub today: NaiveDate,
}

/// Returns whether `item` passes the four filter selectors.
pub fn passes_filters(item: &ChecklistItem, filters: &FilterState, policy: &EnginePolicy) -> bool {
    let equipment = item.equipment_tag();
    let equipment_matches = filters.equipment.accepts(equipment)
        || equipment == policy.common_equipment.as_str();

    filters.category.accepts(item.category_tag())
        && filters.process.accepts(item.process_tag())
        && equipment_matches
        && filters.period.accepts(&item.period_key())
}

/// Returns whether a periodic item is due on `active`.
///
/// `days_since = active - last` in whole days; the item is not due while
/// `days_since < period_days`. Items with no period or no prior completion are
/// always due.
pub fn is_due(item: &ChecklistItem, last_completions: &LastCompletionIndex, active: NaiveDate) -> bool {
    if !item.is_periodic() {
        return true;
    }
    let Some(last) = last_completions.get(&item.id) else {
        return true;
    };

    let days_since = active.signed_duration_since(*last).num_days();
    days_since >= i64::from(item.period_days.unwrap_or(0))
}

/// Returns whether the recurrence gate lets `item` through.
pub fn passes_recurrence_gate(
    item: &ChecklistItem,
    state: &DayState,
    last_completions: &LastCompletionIndex,
    dates: ViewDates,
) -> bool {
    if dates.active >= dates.today || state.is_checked(&item.id) {
        return true;
    }
    is_due(item, last_completions, dates.active)
}

/// Full visibility predicate used by the render pipeline.
pub fn is_visible(
    item: &ChecklistItem,
    filters: &FilterState,
    state: &DayState,
    last_completions: &LastCompletionIndex,
    dates: ViewDates,
    policy: &EnginePolicy,
) -> bool {
    if !passes_filters(item, filters, policy) {
        return false;
    }
    !policy.recurrence_gate || passes_recurrence_gate(item, state, last_completions, dates)
}
