//! Every substring used to judge what the bridge printed lives here.
//!
//! `pm` reports most outcomes as human-readable text on exit code 0, so callers ask
//! these helpers instead of matching output themselves.

pub const DEVICE_LIST_HEADER: &str = "List of devices attached";
pub const DEVICE_READY_STATE: &str = "device";
pub const PACKAGE_LINE_PREFIX: &str = "package:";

const UNAUTHORIZED_MARKER: &str = "unauthorized";
const GENERIC_ERROR_MARKER: &str = "error";
const UNINSTALL_SUCCESS_MARKER: &str = "Success";
// Prefix of both "new state: disabled" and "new state: disabled-user".
const DISABLED_STATE_MARKER: &str = "new state: disabled";
const PM_ERROR_MARKERS: [&str; 3] = ["Error:", "Exception:", "SecurityException"];

/// Why a device listing does not show a usable device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceListProblem {
    MissingHeader,
    Unauthorized,
    ErrorReported,
    NoReadyDevice,
}

impl DeviceListProblem {
    pub fn describe(self) -> &'static str {
        match self {
            Self::MissingHeader => "adb did not return a device list",
            Self::Unauthorized => "device is unauthorized; accept the USB debugging prompt on the phone",
            Self::ErrorReported => "adb reported an error while listing devices",
            Self::NoReadyDevice => "no device in 'device' state is attached",
        }
    }
}

/// Checks the raw `adb devices` text. `ready_devices` is the number of parsed
/// entries whose state is `device`.
pub fn device_list_problem(output: &str, ready_devices: usize) -> Option<DeviceListProblem> {
    if !output.contains(DEVICE_LIST_HEADER) {
        return Some(DeviceListProblem::MissingHeader);
    }
    if output.contains(UNAUTHORIZED_MARKER) {
        return Some(DeviceListProblem::Unauthorized);
    }
    if output.to_lowercase().contains(GENERIC_ERROR_MARKER) {
        return Some(DeviceListProblem::ErrorReported);
    }
    if ready_devices == 0 {
        return Some(DeviceListProblem::NoReadyDevice);
    }
    None
}

pub fn has_pm_error(output: &str) -> bool {
    PM_ERROR_MARKERS.iter().any(|marker| output.contains(marker))
}

pub fn is_uninstall_success(output: &str) -> bool {
    output.contains(UNINSTALL_SUCCESS_MARKER)
}

pub fn is_disable_success(output: &str) -> bool {
    output.contains(DISABLED_STATE_MARKER)
}
