use std::collections::BTreeSet;

use crate::app::adb::markers::{DEVICE_LIST_HEADER, DEVICE_READY_STATE, PACKAGE_LINE_PREFIX};
use crate::app::models::DeviceSummary;

pub fn parse_adb_devices(output: &str) -> Vec<DeviceSummary> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with('*'))
        .filter(|line| !line.contains(DEVICE_LIST_HEADER))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                return None;
            }
            let mut model = None;
            let mut product = None;
            for token in tokens.iter().skip(2) {
                if let Some(value) = token.strip_prefix("model:") {
                    model = Some(value.to_string());
                } else if let Some(value) = token.strip_prefix("product:") {
                    product = Some(value.to_string());
                }
            }
            Some(DeviceSummary {
                serial: tokens[0].to_string(),
                state: tokens[1].to_string(),
                model,
                product,
            })
        })
        .collect()
}

pub fn ready_devices(devices: &[DeviceSummary]) -> impl Iterator<Item = &DeviceSummary> {
    devices
        .iter()
        .filter(|device| device.state == DEVICE_READY_STATE)
}

/// Lines of `pm list packages` look like `package:com.example`. Anything else in the
/// merged stream (daemon banners, warnings) is skipped.
pub fn parse_pm_list_packages_output(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(PACKAGE_LINE_PREFIX))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_lines_and_skips_banners() {
        let output = "* daemon not running; starting now at tcp:5037\n* daemon started successfully\nList of devices attached\nABC123\tdevice product:vayu model:POCO_X3 device:vayu transport_id:1\nXYZ\tunauthorized\n\n";
        let devices = parse_adb_devices(output);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "ABC123");
        assert_eq!(devices[0].state, "device");
        assert_eq!(devices[0].model.as_deref(), Some("POCO_X3"));
        assert_eq!(devices[0].product.as_deref(), Some("vayu"));
        assert_eq!(devices[1].state, "unauthorized");
        assert_eq!(ready_devices(&devices).count(), 1);
    }

    #[test]
    fn package_lines_need_the_prefix() {
        let packages = parse_pm_list_packages_output("package:com.foo.bar\n");
        assert_eq!(packages.into_iter().collect::<Vec<_>>(), vec!["com.foo.bar"]);

        assert!(parse_pm_list_packages_output("com.foo.bar\n").is_empty());
        assert!(parse_pm_list_packages_output("\n   \n").is_empty());
    }

    #[test]
    fn package_lines_are_trimmed_and_deduplicated() {
        let output = "WARNING: linker: something noisy\npackage:com.a  \r\npackage:com.b\npackage:com.a\npackage:\n";
        let packages = parse_pm_list_packages_output(output);
        assert_eq!(
            packages.into_iter().collect::<Vec<_>>(),
            vec!["com.a".to_string(), "com.b".to_string()]
        );
    }
}
