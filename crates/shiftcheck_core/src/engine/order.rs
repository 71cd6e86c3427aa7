//! Deterministic display order for checklist items.
//!
//! # Invariants
//! - The order is a pure function of the item list and the policy.
//! - Tiers: consistency category first (policy), period ascending with
//!   on-demand last, process, equipment (both case-insensitive), `order`
//!   ascending (missing = 0), then id ascending.

use crate::engine::EnginePolicy;
use crate::model::item::ChecklistItem;
use std::cmp::Ordering;

/// Compares two items according to the display order tiers.
pub fn compare_items(a: &ChecklistItem, b: &ChecklistItem, policy: &EnginePolicy) -> Ordering {
    let consistency = if policy.consistency_first {
        // `true` sorts first, hence the reversed operands.
        is_consistency(b, policy).cmp(&is_consistency(a, policy))
    } else {
        Ordering::Equal
    };

    consistency
        .then_with(|| period_rank(a).cmp(&period_rank(b)))
        .then_with(|| sort_tag(a.process.as_deref()).cmp(&sort_tag(b.process.as_deref())))
        .then_with(|| sort_tag(a.equipment.as_deref()).cmp(&sort_tag(b.equipment.as_deref())))
        .then_with(|| a.order.unwrap_or(0).cmp(&b.order.unwrap_or(0)))
        .then_with(|| a.id.cmp(&b.id))
}

/// Returns catalog indices in display order.
pub fn display_order(items: &[ChecklistItem], policy: &EnginePolicy) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..items.len()).collect();
    indices.sort_by(|&left, &right| compare_items(&items[left], &items[right], policy));
    indices
}

fn is_consistency(item: &ChecklistItem, policy: &EnginePolicy) -> bool {
    item.category.as_deref() == Some(policy.consistency_category.as_str())
}

fn period_rank(item: &ChecklistItem) -> u64 {
    item.period_days.map_or(u64::MAX, u64::from)
}

/// Case-folded tag compared by code point, not by locale collation.
fn sort_tag(value: Option<&str>) -> String {
    value.unwrap_or("").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::display_order;
    use crate::engine::EnginePolicy;
    use crate::model::item::ChecklistItem;

    fn item(id: &str, category: &str, period: Option<u32>) -> ChecklistItem {
        let mut item = ChecklistItem::new(id, id);
        item.category = Some(category.to_string());
        item.period_days = period;
        item
    }

    fn tagged(id: &str, process: &str) -> ChecklistItem {
        let mut item = item(id, "S/W", Some(1));
        item.process = Some(process.to_string());
        item
    }

    fn ordered_ids(items: &[ChecklistItem], policy: &EnginePolicy) -> Vec<String> {
        display_order(items, policy)
            .into_iter()
            .map(|index| items[index].id.clone())
            .collect()
    }

    #[test]
    fn consistency_tier_can_be_disabled() {
        let items = vec![item("a", "S/W", Some(1)), item("b", "정합성", Some(7))];

        assert_eq!(ordered_ids(&items, &EnginePolicy::default()), vec!["b", "a"]);

        let policy = EnginePolicy {
            consistency_first: false,
            ..EnginePolicy::default()
        };
        assert_eq!(ordered_ids(&items, &policy), vec!["a", "b"]);
    }

    #[test]
    fn process_tags_compare_case_folded_by_code_point() {
        let items = vec![
            tagged("hangul", "양극"),
            tagged("accented", "Électrode"),
            tagged("upper", "Coater"),
            tagged("lower", "anode"),
            tagged("zeta", "zone"),
        ];

        // Locale collation would put "électrode" between "coater" and "zone";
        // code-point order puts every non-ASCII letter after ASCII.
        assert_eq!(
            ordered_ids(&items, &EnginePolicy::default()),
            vec!["lower", "upper", "zeta", "accented", "hangul"]
        );
    }
}
