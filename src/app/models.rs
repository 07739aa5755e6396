use std::collections::{BTreeMap, BTreeSet};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::app::catalog::{Category, KnownPackage};
use crate::app::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSummary {
    pub serial: String,
    pub state: String,
    pub model: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdbInfo {
    pub available: bool,
    pub version_output: String,
    pub command_path: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandResponse<T> {
    pub trace_id: String,
    pub data: T,
}

/// Known packages that are installed for the primary user, keyed and ordered by
/// package name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstalledBloatware {
    entries: BTreeMap<String, &'static KnownPackage>,
}

impl InstalledBloatware {
    pub fn insert(&mut self, entry: &'static KnownPackage) {
        self.entries.insert(entry.package_name.to_string(), entry);
    }

    pub fn get(&self, package_name: &str) -> Option<&'static KnownPackage> {
        self.entries.get(package_name).copied()
    }

    pub fn contains(&self, package_name: &str) -> bool {
        self.entries.contains_key(package_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static KnownPackage> + '_ {
        self.entries.values().copied()
    }

    /// Distinct categories present, ordered alphabetically by name.
    pub fn categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .iter()
            .map(|entry| entry.category)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        categories.sort_by_key(|category| category.as_str());
        categories
    }
}

impl FromIterator<&'static KnownPackage> for InstalledBloatware {
    fn from_iter<I: IntoIterator<Item = &'static KnownPackage>>(iter: I) -> Self {
        let mut set = Self::default();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub trace_id: String,
    pub devices: Vec<DeviceSummary>,
    /// Number of packages the device listed for the primary user.
    pub installed_count: usize,
    pub bloatware: InstalledBloatware,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessingOutcome {
    Uninstalled,
    Disabled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    pub package_name: String,
    /// Android user the package was processed for.
    pub user_id: u32,
    pub outcome: ProcessingOutcome,
    /// Set when `outcome` is `Failed`.
    pub error: Option<AppError>,
    pub uninstall_output: Option<String>,
    pub disable_output: Option<String>,
}

impl PackageReport {
    pub fn succeeded(&self) -> bool {
        self.outcome != ProcessingOutcome::Failed
    }

    pub fn status_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        match self.outcome {
            ProcessingOutcome::Uninstalled => {
                lines.push(format!(
                    "  Status: Successfully UNINSTALLED {} for user {}.",
                    self.package_name, self.user_id
                ));
            }
            ProcessingOutcome::Disabled => {
                lines.push(format!(
                    "  Uninstall failed for {}. Disabled instead.",
                    self.package_name
                ));
                lines.push(format!(
                    "  Status: Successfully DISABLED {} for user {}.",
                    self.package_name, self.user_id
                ));
            }
            ProcessingOutcome::Failed => {
                if let Some(error) = &self.error {
                    lines.push(format!("  Error: {error}"));
                    if let Some(partial) = &error.partial_output {
                        lines.push(format!("  Partial Output:\n{}", partial.trim()));
                    }
                }
                if let Some(output) = &self.uninstall_output {
                    lines.push(format!("  Uninstall ADB Output:\n{}", output.trim()));
                }
                if let Some(output) = &self.disable_output {
                    lines.push(format!("  Disable ADB Output:\n{}", output.trim()));
                }
                lines.push(format!(
                    "  Status: Failed to UNINSTALL AND DISABLE {}.",
                    self.package_name
                ));
            }
        }
        lines
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub trace_id: String,
    pub uninstalled: usize,
    pub disabled: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &PackageReport) {
        match report.outcome {
            ProcessingOutcome::Uninstalled => self.uninstalled += 1,
            ProcessingOutcome::Disabled => self.disabled += 1,
            ProcessingOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.uninstalled + self.disabled + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub timestamp: String,
    pub trace_id: String,
    pub message: String,
}

impl StatusLine {
    pub fn new(trace_id: &str, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            trace_id: trace_id.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::catalog::lookup;

    #[test]
    fn failed_report_lists_both_outputs() {
        let report = PackageReport {
            package_name: "pkg".to_string(),
            user_id: 0,
            outcome: ProcessingOutcome::Failed,
            error: Some(AppError::no_match("no marker", "t")),
            uninstall_output: Some("Failure [DELETE_FAILED]\n".to_string()),
            disable_output: Some("weird\n".to_string()),
        };
        let text = report.status_lines().join("\n");
        assert!(text.contains("Failure [DELETE_FAILED]"));
        assert!(text.contains("weird"));
        assert!(!report.succeeded());
    }

    #[test]
    fn installed_set_reports_categories() {
        let set: InstalledBloatware = [
            "com.miui.analytics",
            "com.facebook.katana",
            "com.miui.cleaner",
            "com.android.traceur",
        ]
            .into_iter()
            .filter_map(lookup)
            .collect();
        assert_eq!(set.len(), 4);
        assert_eq!(
            set.categories(),
            vec![Category::AndroidSystem, Category::Facebook, Category::Xiaomi]
        );
    }
}
