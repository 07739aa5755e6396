//! Filter and selection state behind the package list. Owned by whichever thread
//! renders the list; background work never touches it directly.

use serde::{Deserialize, Serialize};

use crate::app::catalog::{Category, KnownPackage, SafetyLevel};
use crate::app::models::InstalledBloatware;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// `None` shows every level.
    pub safety: Option<SafetyLevel>,
    pub category: Option<Category>,
}

impl Filters {
    pub fn matches(&self, entry: &KnownPackage) -> bool {
        self.safety.map_or(true, |level| entry.safety == level)
            && self.category.map_or(true, |category| entry.category == category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewWarning {
    None,
    Caution,
    Risky,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSummary {
    pub packages: Vec<&'static KnownPackage>,
    pub warning: ReviewWarning,
    pub message: String,
}

impl ReviewSummary {
    pub fn package_names(&self) -> Vec<String> {
        self.packages
            .iter()
            .map(|entry| entry.package_name.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    inventory: InstalledBloatware,
    filters: Filters,
    selected: Vec<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the result of a fresh scan. Filters reset to "All" and the selection
    /// is cleared.
    pub fn replace_inventory(&mut self, inventory: InstalledBloatware) {
        self.inventory = inventory;
        self.filters = Filters::default();
        self.selected.clear();
    }

    pub fn inventory(&self) -> &InstalledBloatware {
        &self.inventory
    }

    pub fn filters(&self) -> Filters {
        self.filters
    }

    /// Selections hidden by the new filters are dropped.
    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
        let inventory = &self.inventory;
        self.selected.retain(|name| {
            inventory
                .get(name)
                .is_some_and(|entry| filters.matches(entry))
        });
    }

    /// Visible entries sorted by package name.
    pub fn visible(&self) -> Vec<&'static KnownPackage> {
        self.inventory
            .iter()
            .filter(|entry| self.filters.matches(entry))
            .collect()
    }

    fn visible_entry(&self, package_name: &str) -> Option<&'static KnownPackage> {
        self.inventory
            .get(package_name)
            .filter(|entry| self.filters.matches(entry))
    }

    pub fn is_selected(&self, package_name: &str) -> bool {
        self.selected.iter().any(|name| name == package_name)
    }

    /// Flips one visible row. Returns the new state, or `None` when the package is
    /// not on screen.
    pub fn toggle(&mut self, package_name: &str) -> Option<bool> {
        self.visible_entry(package_name)?;
        if let Some(index) = self.selected.iter().position(|name| name == package_name) {
            self.selected.remove(index);
            Some(false)
        } else {
            self.selected.push(package_name.to_string());
            Some(true)
        }
    }

    pub fn select(&mut self, package_name: &str) -> bool {
        if self.visible_entry(package_name).is_none() {
            return false;
        }
        if !self.is_selected(package_name) {
            self.selected.push(package_name.to_string());
        }
        true
    }

    pub fn select_all(&mut self) {
        for entry in self.visible() {
            self.select(entry.package_name);
        }
    }

    pub fn select_none(&mut self) {
        self.selected.clear();
    }

    /// Replaces the selection with every visible package of `level`.
    pub fn select_by_safety(&mut self, level: SafetyLevel) {
        self.select_none();
        for entry in self.visible() {
            if entry.safety == level {
                self.selected.push(entry.package_name.to_string());
            }
        }
    }

    /// Selected package names in the order they were selected.
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// What the confirmation step shows. `None` when nothing is selected.
    pub fn review(&self) -> Option<ReviewSummary> {
        let packages: Vec<_> = self
            .selected
            .iter()
            .filter_map(|name| self.inventory.get(name))
            .collect();
        if packages.is_empty() {
            return None;
        }

        let mut message =
            "Review the list below carefully. This action cannot be easily undone.".to_string();
        let warning = if packages.iter().any(|entry| entry.safety == SafetyLevel::Risky) {
            message.push_str(
                "\n\nWARNING: Apps marked RISKY are included. This may cause significant system issues or bootloops. PROCEED WITH EXTREME CAUTION.",
            );
            ReviewWarning::Risky
        } else if packages.iter().any(|entry| entry.safety == SafetyLevel::Caution) {
            message.push_str(
                "\n\nCAUTION: Apps marked CAUTION are included. This may affect features.",
            );
            ReviewWarning::Caution
        } else {
            ReviewWarning::None
        };

        Some(ReviewSummary {
            packages,
            warning,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::catalog::lookup;

    fn state_with(names: &[&str]) -> SelectionState {
        let mut state = SelectionState::new();
        state.replace_inventory(names.iter().filter_map(|name| lookup(name)).collect());
        state
    }

    const MIXED: [&str; 4] = [
        "com.miui.msa.global",
        "com.google.android.as",
        "com.xiaomi.xmsf",
        "com.facebook.katana",
    ];

    #[test]
    fn visible_rows_are_sorted_and_filtered() {
        let mut state = state_with(&MIXED);
        let names: Vec<_> = state.visible().iter().map(|e| e.package_name).collect();
        assert_eq!(
            names,
            vec![
                "com.facebook.katana",
                "com.google.android.as",
                "com.miui.msa.global",
                "com.xiaomi.xmsf",
            ]
        );

        state.set_filters(Filters {
            safety: Some(SafetyLevel::Safe),
            category: Some(Category::Xiaomi),
        });
        let names: Vec<_> = state.visible().iter().map(|e| e.package_name).collect();
        assert_eq!(names, vec!["com.miui.msa.global"]);
    }

    #[test]
    fn toggle_ignores_hidden_rows() {
        let mut state = state_with(&MIXED);
        state.set_filters(Filters {
            safety: Some(SafetyLevel::Risky),
            category: None,
        });
        assert_eq!(state.toggle("com.facebook.katana"), None);
        assert_eq!(state.toggle("com.xiaomi.xmsf"), Some(true));
        assert_eq!(state.toggle("com.xiaomi.xmsf"), Some(false));
        assert!(state.selected().is_empty());
    }

    #[test]
    fn narrowing_filters_drops_hidden_selections() {
        let mut state = state_with(&MIXED);
        state.select_all();
        assert_eq!(state.selected().len(), 4);
        state.set_filters(Filters {
            safety: Some(SafetyLevel::Safe),
            category: None,
        });
        assert_eq!(
            state.selected(),
            ["com.facebook.katana".to_string(), "com.miui.msa.global".to_string()]
        );
    }

    #[test]
    fn select_by_safety_replaces_the_selection() {
        let mut state = state_with(&MIXED);
        state.toggle("com.xiaomi.xmsf");
        state.select_by_safety(SafetyLevel::Caution);
        assert_eq!(state.selected(), ["com.google.android.as".to_string()]);
    }

    #[test]
    fn selection_order_is_preserved() {
        let mut state = state_with(&MIXED);
        state.toggle("com.miui.msa.global");
        state.toggle("com.facebook.katana");
        assert_eq!(
            state.review().expect("review").package_names(),
            vec!["com.miui.msa.global", "com.facebook.katana"]
        );
    }

    #[test]
    fn review_escalates_warnings() {
        let mut state = state_with(&MIXED);
        assert!(state.review().is_none());

        state.toggle("com.miui.msa.global");
        assert_eq!(state.review().expect("review").warning, ReviewWarning::None);

        state.toggle("com.google.android.as");
        assert_eq!(state.review().expect("review").warning, ReviewWarning::Caution);

        state.toggle("com.xiaomi.xmsf");
        let review = state.review().expect("review");
        assert_eq!(review.warning, ReviewWarning::Risky);
        assert!(review.message.contains("RISKY"));
    }

    #[test]
    fn new_scan_resets_filters_and_selection() {
        let mut state = state_with(&MIXED);
        state.set_filters(Filters {
            safety: Some(SafetyLevel::Safe),
            category: None,
        });
        state.select_all();
        state.replace_inventory(["com.miui.cleaner"].iter().filter_map(|name| lookup(name)).collect());
        assert_eq!(state.filters(), Filters::default());
        assert!(state.selected().is_empty());
        assert_eq!(state.visible().len(), 1);
    }
}
