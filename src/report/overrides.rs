//! The user's "ignore this column" decisions.

use std::collections::BTreeSet;

/// Set of overridden `(sheet, column)` pairs.
///
/// Overrides only change report verdicts; analysis results are never touched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverrideSet {
    pairs: BTreeSet<(String, String)>,
}

impl OverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a presentation-layer toggle map. Pairs mapped to `false` are left out.
    pub fn from_toggles<I, S, C>(toggles: I) -> Self
    where
        I: IntoIterator<Item = ((S, C), bool)>,
        S: Into<String>,
        C: Into<String>,
    {
        let pairs = toggles
            .into_iter()
            .filter(|(_, on)| *on)
            .map(|((sheet, column), _)| (sheet.into(), column.into()))
            .collect();
        Self { pairs }
    }

    /// Turn the override for a pair on or off.
    pub fn set(&mut self, sheet: &str, column: &str, overridden: bool) {
        let key = (sheet.to_string(), column.to_string());
        if overridden {
            self.pairs.insert(key);
        } else {
            self.pairs.remove(&key);
        }
    }

    /// Flip the override for a pair; returns the new state.
    pub fn toggle(&mut self, sheet: &str, column: &str) -> bool {
        let on = !self.is_overridden(sheet, column);
        self.set(sheet, column, on);
        on
    }

    pub fn is_overridden(&self, sheet: &str, column: &str) -> bool {
        self.pairs.contains(&(sheet.to_string(), column.to_string()))
    }

    /// Iterate `(sheet, column)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(s, c)| (s.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::OverrideSet;

    #[test]
    fn toggling_twice_restores_state() {
        let mut set = OverrideSet::new();
        assert!(set.toggle("Data", "Age"));
        assert!(set.is_overridden("Data", "Age"));
        assert!(!set.is_overridden("Other", "Age"));
        assert!(!set.toggle("Data", "Age"));
        assert!(set.is_empty());
    }

    #[test]
    fn from_toggles_keeps_only_enabled_pairs() {
        let set = OverrideSet::from_toggles([
            (("Data", "Age"), true),
            (("Data", "Name"), false),
            (("Other", "Code"), true),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![("Data", "Age"), ("Other", "Code")]
        );
    }
}
