use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::app::adb::client::AdbClient;
use crate::app::adb::markers::{device_list_problem, has_pm_error};
use crate::app::adb::parse::{parse_adb_devices, parse_pm_list_packages_output, ready_devices};
use crate::app::catalog;
use crate::app::error::{AppError, ERR_TOOL_NOT_FOUND};
use crate::app::models::{DeviceSummary, InstalledBloatware, ScanReport};

/// Verifies that a device is attached, authorized and ready. Failures carry code
/// `ERR_CONNECTIVITY` so callers can point the user at USB debugging rather than
/// at the command itself.
pub fn check_connectivity(
    client: &AdbClient,
    trace_id: &str,
) -> Result<Vec<DeviceSummary>, AppError> {
    let output = client.devices(trace_id)?;
    let devices = parse_adb_devices(&output.output);

    if !output.exited_cleanly() {
        return Err(AppError::connectivity(
            format!("adb devices exited with {:?}", output.exit_code),
            trace_id,
        )
        .with_output(output.output));
    }
    let ready = ready_devices(&devices).count();
    if let Some(problem) = device_list_problem(&output.output, ready) {
        warn!(trace_id = %trace_id, problem = ?problem, "device not ready");
        return Err(
            AppError::connectivity(problem.describe(), trace_id).with_output(output.output)
        );
    }
    if let Some(serial) = client.serial() {
        if !ready_devices(&devices).any(|device| device.serial == serial) {
            return Err(AppError::connectivity(
                format!("device {serial} is not attached or not ready"),
                trace_id,
            )
            .with_output(output.output));
        }
    }

    Ok(devices)
}

pub fn fetch_installed_packages(
    client: &AdbClient,
    trace_id: &str,
) -> Result<BTreeSet<String>, AppError> {
    let output = client.list_packages(trace_id)?;
    if !output.exited_cleanly() || has_pm_error(&output.output) {
        return Err(AppError::command_failed(
            format!(
                "pm list packages returned an error (exit code {:?})",
                output.exit_code
            ),
            trace_id,
        )
        .with_output(output.output));
    }
    Ok(parse_pm_list_packages_output(&output.output))
}

pub fn match_known_packages(installed: &BTreeSet<String>) -> InstalledBloatware {
    catalog::known_packages()
        .iter()
        .filter(|entry| installed.contains(entry.package_name))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    Connectivity,
    PackageList,
}

/// A scan error together with the step that produced it.
#[derive(Debug, Clone)]
pub struct ScanFailure {
    pub stage: ScanStage,
    pub error: AppError,
}

impl ScanFailure {
    /// What the user should look at next.
    pub fn advice(&self) -> &'static str {
        if self.error.code == ERR_TOOL_NOT_FOUND {
            return "Install the Android platform tools and put adb on your PATH, or set adb.command_path in the config.";
        }
        match self.stage {
            ScanStage::Connectivity => {
                "Please ensure your phone is connected, USB Debugging is ON, and this computer is authorized."
            }
            ScanStage::PackageList => "Failed to get package list.",
        }
    }
}

/// Connectivity check, package listing and knowledge-base lookup in one pass.
/// `report` receives human-readable progress lines as they happen.
pub fn scan(
    client: &AdbClient,
    trace_id: &str,
    report: &mut dyn FnMut(String),
) -> Result<ScanReport, ScanFailure> {
    report("Checking ADB connection...".to_string());
    let devices = check_connectivity(client, trace_id).map_err(|error| ScanFailure {
        stage: ScanStage::Connectivity,
        error,
    })?;
    report("ADB connection successful.".to_string());

    report(format!(
        "Fetching list of installed packages from the device for user {}...",
        client.user_id()
    ));
    let installed = fetch_installed_packages(client, trace_id).map_err(|error| ScanFailure {
        stage: ScanStage::PackageList,
        error,
    })?;
    let bloatware = match_known_packages(&installed);
    info!(
        trace_id = %trace_id,
        installed = installed.len(),
        known = bloatware.len(),
        "scan finished"
    );

    if bloatware.is_empty() {
        report(format!(
            "No known bloatware apps from the database found installed on your device for user {}.",
            client.user_id()
        ));
    } else {
        report(format!(
            "Found {} known bloatware/removable apps installed (for user {}).",
            bloatware.len(),
            client.user_id()
        ));
    }

    Ok(ScanReport {
        trace_id: trace_id.to_string(),
        devices,
        installed_count: installed.len(),
        bloatware,
    })
}
