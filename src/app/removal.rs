use tracing::{info, warn};

use crate::app::adb::client::AdbClient;
use crate::app::adb::markers::{is_disable_success, is_uninstall_success};
use crate::app::error::AppError;
use crate::app::models::{BatchSummary, PackageReport, ProcessingOutcome};

/// Uninstalls `package_name` for the primary user, falling back to disabling it when
/// the device refuses the uninstall.
pub fn process_package(client: &AdbClient, package_name: &str, trace_id: &str) -> PackageReport {
    let package_name = package_name.trim();
    if package_name.is_empty() {
        return failed(
            client,
            package_name,
            AppError::validation("package name is required", trace_id),
            None,
            None,
        );
    }

    let uninstall = match client.uninstall(package_name, trace_id) {
        Ok(output) => output,
        Err(err) => {
            warn!(trace_id = %trace_id, package = %package_name, code = %err.code, "uninstall could not run");
            return failed(client, package_name, err, None, None);
        }
    };
    if is_uninstall_success(&uninstall.output) {
        info!(trace_id = %trace_id, package = %package_name, "uninstalled");
        return PackageReport {
            package_name: package_name.to_string(),
            user_id: client.user_id(),
            outcome: ProcessingOutcome::Uninstalled,
            error: None,
            uninstall_output: Some(uninstall.output),
            disable_output: None,
        };
    }

    info!(trace_id = %trace_id, package = %package_name, "uninstall refused, disabling");
    let disable = match client.disable(package_name, trace_id) {
        Ok(output) => output,
        Err(err) => {
            warn!(trace_id = %trace_id, package = %package_name, code = %err.code, "disable could not run");
            return failed(client, package_name, err, Some(uninstall.output), None);
        }
    };
    if is_disable_success(&disable.output) {
        info!(trace_id = %trace_id, package = %package_name, "disabled");
        return PackageReport {
            package_name: package_name.to_string(),
            user_id: client.user_id(),
            outcome: ProcessingOutcome::Disabled,
            error: None,
            uninstall_output: Some(uninstall.output),
            disable_output: Some(disable.output),
        };
    }

    warn!(trace_id = %trace_id, package = %package_name, "neither uninstall nor disable reported success");
    failed(
        client,
        package_name,
        AppError::no_match(
            format!("neither uninstall nor disable of {package_name} reported success"),
            trace_id,
        ),
        Some(uninstall.output),
        Some(disable.output),
    )
}

/// Processes `packages` one after another in the given order. `on_report` sees each
/// report before the next package starts; a failed package never stops the batch.
pub fn process_batch(
    client: &AdbClient,
    packages: &[String],
    trace_id: &str,
    on_report: &mut dyn FnMut(&PackageReport),
) -> BatchSummary {
    let mut summary = BatchSummary::new(trace_id);
    for package_name in packages {
        let report = process_package(client, package_name, trace_id);
        summary.record(&report);
        on_report(&report);
    }
    info!(
        trace_id = %trace_id,
        uninstalled = summary.uninstalled,
        disabled = summary.disabled,
        failed = summary.failed,
        "batch finished"
    );
    summary
}

fn failed(
    client: &AdbClient,
    package_name: &str,
    error: AppError,
    uninstall_output: Option<String>,
    disable_output: Option<String>,
) -> PackageReport {
    PackageReport {
        package_name: package_name.to_string(),
        user_id: client.user_id(),
        outcome: ProcessingOutcome::Failed,
        error: Some(error),
        uninstall_output,
        disable_output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adb::testing::ScriptedExecutor;
    use crate::app::config::CommandSettings;
    use crate::app::error::{ERR_NO_MATCH, ERR_TIMEOUT, ERR_VALIDATION};
    use std::sync::Arc;

    fn scripted_client(executor: ScriptedExecutor) -> (Arc<ScriptedExecutor>, AdbClient) {
        let executor = Arc::new(executor);
        let client = AdbClient::with_executor(
            executor.clone(),
            "adb",
            &CommandSettings::default(),
            None,
        );
        (executor, client)
    }

    #[test]
    fn successful_uninstall_skips_disable() {
        let (executor, client) =
            scripted_client(ScriptedExecutor::new().reply("uninstall", 0, "Success\n"));
        let report = process_package(&client, "pkg", "t");
        assert_eq!(report.outcome, ProcessingOutcome::Uninstalled);
        assert_eq!(executor.count_calls("disable-user"), 0);
    }

    #[test]
    fn status_lines_name_the_configured_user() {
        let executor = Arc::new(
            ScriptedExecutor::new()
                .reply("uninstall -k --user 10 com.first", 0, "Success\n")
                .reply("uninstall -k --user 10 com.second", 0, "Failure [DELETE_FAILED]\n")
                .reply("disable-user --user 10 com.second", 0, "Package com.second new state: disabled-user\n"),
        );
        let settings = CommandSettings {
            user_id: 10,
            ..CommandSettings::default()
        };
        let client = AdbClient::with_executor(executor, "adb", &settings, None);

        let uninstalled = process_package(&client, "com.first", "t");
        assert_eq!(uninstalled.user_id, 10);
        assert_eq!(
            uninstalled.status_lines(),
            vec!["  Status: Successfully UNINSTALLED com.first for user 10.".to_string()]
        );

        let disabled = process_package(&client, "com.second", "t");
        assert_eq!(disabled.outcome, ProcessingOutcome::Disabled);
        assert_eq!(
            disabled.status_lines().last().map(String::as_str),
            Some("  Status: Successfully DISABLED com.second for user 10.")
        );
    }

    #[test]
    fn refused_uninstall_falls_back_to_disable() {
        let (_, client) = scripted_client(
            ScriptedExecutor::new()
                .reply("uninstall", 1, "Failure [DELETE_FAILED_INTERNAL_ERROR]\n")
                .reply("disable-user", 0, "Package pkg new state: disabled-user\n"),
        );
        let report = process_package(&client, "pkg", "t");
        assert_eq!(report.outcome, ProcessingOutcome::Disabled);
        assert!(report.error.is_none());
    }

    #[test]
    fn unrecognized_outputs_fail_and_keep_both_texts() {
        let (_, client) = scripted_client(
            ScriptedExecutor::new()
                .reply("uninstall", 0, "Failure [not installed for 0]\n")
                .reply("disable-user", 0, "Error: java.lang.IllegalArgumentException\n"),
        );
        let report = process_package(&client, "pkg", "t");
        assert_eq!(report.outcome, ProcessingOutcome::Failed);
        assert_eq!(report.error.as_ref().map(|err| err.code.as_str()), Some(ERR_NO_MATCH));
        assert_eq!(report.uninstall_output.as_deref(), Some("Failure [not installed for 0]\n"));
        assert_eq!(
            report.disable_output.as_deref(),
            Some("Error: java.lang.IllegalArgumentException\n")
        );
    }

    #[test]
    fn executor_failure_on_uninstall_skips_disable() {
        let (executor, client) = scripted_client(ScriptedExecutor::new().fail(
            "uninstall",
            AppError::timeout("slow", "partial".to_string(), ""),
        ));
        let report = process_package(&client, "pkg", "t");
        assert_eq!(report.outcome, ProcessingOutcome::Failed);
        let error = report.error.expect("error");
        assert_eq!(error.code, ERR_TIMEOUT);
        assert_eq!(error.partial_output.as_deref(), Some("partial"));
        assert_eq!(executor.count_calls("disable-user"), 0);
    }

    #[test]
    fn blank_package_is_rejected_without_running_adb() {
        let (executor, client) = scripted_client(ScriptedExecutor::new());
        let report = process_package(&client, "   ", "t");
        assert_eq!(report.outcome, ProcessingOutcome::Failed);
        assert_eq!(report.error.map(|err| err.code), Some(ERR_VALIDATION.to_string()));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn batch_continues_past_failures_in_order() {
        let (executor, client) = scripted_client(
            ScriptedExecutor::new()
                .reply("uninstall -k --user 0 com.first", 0, "Success\n")
                .fail(
                    "uninstall -k --user 0 com.second",
                    AppError::system("pipe broke", ""),
                )
                .reply("uninstall -k --user 0 com.third", 0, "Failure [DELETE_FAILED]\n")
                .reply("disable-user --user 0 com.third", 0, "Package com.third new state: disabled\n"),
        );
        let packages = vec![
            "com.first".to_string(),
            "com.second".to_string(),
            "com.third".to_string(),
        ];

        let mut seen = Vec::new();
        let summary = process_batch(&client, &packages, "t-batch", &mut |report| {
            seen.push((report.package_name.clone(), report.outcome));
        });

        assert_eq!(
            seen,
            vec![
                ("com.first".to_string(), ProcessingOutcome::Uninstalled),
                ("com.second".to_string(), ProcessingOutcome::Failed),
                ("com.third".to_string(), ProcessingOutcome::Disabled),
            ]
        );
        assert_eq!((summary.uninstalled, summary.disabled, summary.failed), (1, 1, 1));
        assert_eq!(summary.total(), 3);
        assert_eq!(
            executor.calls(),
            vec![
                "shell pm uninstall -k --user 0 com.first",
                "shell pm uninstall -k --user 0 com.second",
                "shell pm uninstall -k --user 0 com.third",
                "shell pm disable-user --user 0 com.third",
            ]
        );
    }
}
