//! Client-side filter selections.

use serde::{Deserialize, Serialize};

/// Selector value meaning "no restriction".
pub const ALL_SELECTOR: &str = "all";

/// One filter selector: `All` or one concrete tag value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    /// Parses a selector from its UI value; `all` and blank map to `All`.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_SELECTOR) {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    /// Returns whether `value` passes this selector.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected == value,
        }
    }

    /// Returns whether this selector can match something in `offered`.
    /// `All` always can.
    pub fn is_offered(&self, offered: &[String]) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => offered.iter().any(|value| value == selected),
        }
    }

    /// Resets to `All` when the selected value is not offered anymore.
    pub fn retain_if_offered(&mut self, offered: &[String]) {
        if !self.is_offered(offered) {
            *self = Self::All;
        }
    }
}

/// The four independent filter selectors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub process: Selector,
    pub equipment: Selector,
    /// Period key: days as decimal string, or `custom`.
    pub period: Selector,
    pub category: Selector,
}

impl FilterState {
    /// Returns whether every selector is `All`.
    pub fn is_unrestricted(&self) -> bool {
        [&self.process, &self.equipment, &self.period, &self.category]
            .iter()
            .all(|selector| **selector == Selector::All)
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterState, Selector};

    #[test]
    fn parse_maps_all_and_blank_to_all() {
        assert_eq!(Selector::parse("all"), Selector::All);
        assert_eq!(Selector::parse("  "), Selector::All);
        assert_eq!(Selector::parse("음극"), Selector::Only("음극".to_string()));
    }

    #[test]
    fn retain_if_offered_resets_vanished_value() {
        let mut selector = Selector::Only("포일".to_string());
        selector.retain_if_offered(&["통합".to_string()]);
        assert_eq!(selector, Selector::All);
    }

    #[test]
    fn offered_check_is_exact_match() {
        let offered = vec!["Anode".to_string(), "Cathode".to_string()];
        assert!(Selector::All.is_offered(&offered));
        assert!(Selector::Only("Anode".to_string()).is_offered(&offered));
        assert!(!Selector::Only("Anod".to_string()).is_offered(&offered));
        assert!(!Selector::Only("anode".to_string()).is_offered(&offered));
    }

    #[test]
    fn unrestricted_only_when_every_selector_is_all() {
        assert!(FilterState::default().is_unrestricted());
        let filters = FilterState {
            period: Selector::Only("7".to_string()),
            ..FilterState::default()
        };
        assert!(!filters.is_unrestricted());
    }
}
