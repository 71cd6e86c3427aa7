//! Progress statistics over the visible item set.

use crate::engine::StatsScope;
use crate::model::completion::DayState;
use crate::model::item::ChecklistItem;
use serde::Serialize;

/// Counts shown above the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChecklistStats {
    pub total: usize,
    pub checked: usize,
    /// Rounded percentage, `0` when `total == 0`.
    pub progress: u32,
}

/// Derives statistics for the visible (post-filter) items.
pub fn compute_stats(
    visible: &[&ChecklistItem],
    state: &DayState,
    scope: StatsScope,
    active_user: &str,
) -> ChecklistStats {
    let total = visible.len();
    let checked = visible
        .iter()
        .filter(|item| match scope {
            StatsScope::AnyUser => state.is_checked(&item.id),
            StatsScope::ActiveUser => state.is_checked_by(&item.id, active_user),
        })
        .count();

    ChecklistStats {
        total,
        checked,
        progress: progress_percent(checked, total),
    }
}

/// `round(checked / total * 100)`, or `0` for an empty set.
pub fn progress_percent(checked: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((checked as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::progress_percent;

    #[test]
    fn progress_rounds_half_up() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(0, 0), 0);
    }
}
