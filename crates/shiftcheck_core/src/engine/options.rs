//! Filter option sets derived from the item catalog.

use crate::model::filter::{FilterState, Selector};
use crate::model::item::{ChecklistItem, CUSTOM_PERIOD_KEY};
use serde::Serialize;
use std::collections::BTreeSet;

/// Distinct selectable values for each filter, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub processes: Vec<String>,
    pub equipment: Vec<String>,
    pub categories: Vec<String>,
    /// Period keys in numeric order, `custom` last.
    pub periods: Vec<String>,
}

impl FilterOptions {
    /// Collects options from item tags (with `General` defaults).
    pub fn from_items(items: &[ChecklistItem]) -> Self {
        let mut processes = BTreeSet::new();
        let mut equipment = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut periods = BTreeSet::new();

        for item in items {
            processes.insert(item.process_tag().to_string());
            equipment.insert(item.equipment_tag().to_string());
            categories.insert(item.category_tag().to_string());
            periods.insert(item.period_days);
        }

        // `None` sorts first in `Option` order; move it to the end.
        let mut period_keys: Vec<String> = periods
            .iter()
            .flatten()
            .map(|days| days.to_string())
            .collect();
        if periods.contains(&None) {
            period_keys.push(CUSTOM_PERIOD_KEY.to_string());
        }

        Self {
            processes: processes.into_iter().collect(),
            equipment: equipment.into_iter().collect(),
            categories: categories.into_iter().collect(),
            periods: period_keys,
        }
    }

    /// First selector naming a value this option set does not offer, as
    /// `(selector name, value)`.
    pub fn first_unoffered<'a>(&self, filters: &'a FilterState) -> Option<(&'static str, &'a str)> {
        [
            ("process", &filters.process, &self.processes),
            ("equipment", &filters.equipment, &self.equipment),
            ("category", &filters.category, &self.categories),
            ("period", &filters.period, &self.periods),
        ]
        .into_iter()
        .find_map(|(name, selector, offered)| match selector {
            Selector::Only(value) if !selector.is_offered(offered) => Some((name, value.as_str())),
            _ => None,
        })
    }

    /// Resets selectors whose value is no longer offered. Used when the
    /// catalog is reloaded under existing selections.
    pub fn reconcile(&self, filters: &mut FilterState) {
        filters.process.retain_if_offered(&self.processes);
        filters.equipment.retain_if_offered(&self.equipment);
        filters.category.retain_if_offered(&self.categories);
        filters.period.retain_if_offered(&self.periods);
    }
}

#[cfg(test)]
mod tests {
    use super::FilterOptions;
    use crate::model::filter::{FilterState, Selector};
    use crate::model::item::ChecklistItem;

    #[test]
    fn periods_sort_numerically_with_custom_last() {
        let mut daily = ChecklistItem::new("a", "a");
        daily.period_days = Some(1);
        let mut monthly = ChecklistItem::new("b", "b");
        monthly.period_days = Some(30);
        let mut weekly = ChecklistItem::new("c", "c");
        weekly.period_days = Some(7);
        let on_demand = ChecklistItem::new("d", "d");

        let options = FilterOptions::from_items(&[monthly, on_demand, daily, weekly]);
        assert_eq!(options.periods, vec!["1", "7", "30", "custom"]);
        assert_eq!(options.processes, vec!["General"]);
    }

    #[test]
    fn reconcile_keeps_offered_values() {
        let mut item = ChecklistItem::new("a", "a");
        item.process = Some("양극".to_string());
        let options = FilterOptions::from_items(&[item]);

        let mut filters = FilterState {
            process: Selector::Only("양극".to_string()),
            category: Selector::Only("정합성".to_string()),
            ..FilterState::default()
        };
        options.reconcile(&mut filters);
        assert_eq!(filters.process, Selector::Only("양극".to_string()));
        assert_eq!(filters.category, Selector::All);
    }

    #[test]
    fn first_unoffered_names_the_mistyped_selector() {
        let mut anode = ChecklistItem::new("a", "a");
        anode.equipment = Some("Anode".to_string());
        let mut cathode = ChecklistItem::new("b", "b");
        cathode.equipment = Some("Cathode".to_string());
        let options = FilterOptions::from_items(&[anode, cathode]);

        let filters = FilterState {
            equipment: Selector::Only("Anod".to_string()),
            ..FilterState::default()
        };
        assert_eq!(options.first_unoffered(&filters), Some(("equipment", "Anod")));

        let filters = FilterState {
            equipment: Selector::Only("Cathode".to_string()),
            period: Selector::Only("custom".to_string()),
            ..FilterState::default()
        };
        assert_eq!(options.first_unoffered(&filters), None);
    }
}
