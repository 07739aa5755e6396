use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::adb::locator::{resolve_adb_program, validate_adb_program};
use crate::app::adb::runner::{run_command_with_limits, CommandLimits, CommandOutput};
use crate::app::config::{AppConfig, CommandSettings};
use crate::app::error::AppError;
use crate::app::models::AdbInfo;

const VERSION_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one bridge invocation. The process-backed implementation is
/// [`ProcessExecutor`]; tests swap in scripted ones.
pub trait AdbExecutor: Send + Sync {
    fn execute(
        &self,
        args: &[String],
        limits: CommandLimits,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError>;
}

pub struct ProcessExecutor {
    program: String,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl AdbExecutor for ProcessExecutor {
    fn execute(
        &self,
        args: &[String],
        limits: CommandLimits,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        run_command_with_limits(&self.program, args, limits, trace_id)
    }
}

/// Builds the fixed `adb` argument shapes and runs them with the configured limits.
#[derive(Clone)]
pub struct AdbClient {
    executor: Arc<dyn AdbExecutor>,
    program: String,
    limits: CommandLimits,
    user_id: u32,
    keep_data: bool,
    serial: Option<String>,
}

impl AdbClient {
    pub fn from_config(config: &AppConfig) -> Self {
        let program = resolve_adb_program(&config.adb.command_path);
        Self::with_executor(
            Arc::new(ProcessExecutor::new(program.clone())),
            program,
            &config.command,
            config.adb.serial.clone(),
        )
    }

    pub fn with_executor(
        executor: Arc<dyn AdbExecutor>,
        program: impl Into<String>,
        settings: &CommandSettings,
        serial: Option<String>,
    ) -> Self {
        Self {
            executor,
            program: program.into(),
            limits: settings.limits(),
            user_id: settings.user_id,
            keep_data: settings.keep_data,
            serial: serial.filter(|value| !value.trim().is_empty()),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    pub fn user_id(&self) -> u32 {
        self.user_id
    }

    pub fn version(&self, trace_id: &str) -> Result<CommandOutput, AppError> {
        let limits = CommandLimits {
            timeout: VERSION_TIMEOUT.min(self.limits.timeout),
            ..self.limits
        };
        self.executor
            .execute(&["version".to_string()], limits, trace_id)
    }

    pub fn devices(&self, trace_id: &str) -> Result<CommandOutput, AppError> {
        self.executor
            .execute(&["devices".to_string()], self.limits, trace_id)
    }

    pub fn list_packages(&self, trace_id: &str) -> Result<CommandOutput, AppError> {
        let user = self.user_id.to_string();
        let args = self.shell_args(&["pm", "list", "packages", "--user", &user]);
        self.executor.execute(&args, self.limits, trace_id)
    }

    pub fn uninstall(&self, package_name: &str, trace_id: &str) -> Result<CommandOutput, AppError> {
        let user = self.user_id.to_string();
        let mut parts = vec!["pm", "uninstall"];
        if self.keep_data {
            parts.push("-k");
        }
        parts.extend(["--user", user.as_str(), package_name]);
        let args = self.shell_args(&parts);
        self.executor.execute(&args, self.limits, trace_id)
    }

    pub fn disable(&self, package_name: &str, trace_id: &str) -> Result<CommandOutput, AppError> {
        let user = self.user_id.to_string();
        let args = self.shell_args(&["pm", "disable-user", "--user", &user, package_name]);
        self.executor.execute(&args, self.limits, trace_id)
    }

    fn shell_args(&self, parts: &[&str]) -> Vec<String> {
        let mut args = Vec::with_capacity(parts.len() + 3);
        if let Some(serial) = &self.serial {
            args.push("-s".to_string());
            args.push(serial.clone());
        }
        args.push("shell".to_string());
        args.extend(parts.iter().map(|part| part.to_string()));
        args
    }
}

/// Reports whether the configured adb binary can be found and run.
pub fn probe_adb(client: &AdbClient, trace_id: &str) -> AdbInfo {
    info!(trace_id = %trace_id, program = %client.program(), "probe_adb");
    let unavailable = |error: String| AdbInfo {
        available: false,
        version_output: String::new(),
        command_path: client.program().to_string(),
        error: Some(error),
    };

    if let Err(err) = validate_adb_program(client.program(), trace_id) {
        warn!(trace_id = %trace_id, error = %err.error, "adb validation failed");
        return unavailable(err.error);
    }
    let output = match client.version(trace_id) {
        Ok(output) => output,
        Err(err) => {
            warn!(trace_id = %trace_id, error = %err.error, "adb check failed");
            return unavailable(err.error);
        }
    };
    if !output.exited_cleanly() {
        return unavailable(format!(
            "adb version exited with {:?}: {}",
            output.exit_code,
            output.output.trim()
        ));
    }

    AdbInfo {
        available: true,
        version_output: output.output.trim().to_string(),
        command_path: client.program().to_string(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::adb::testing::ScriptedExecutor;

    fn client(executor: &Arc<ScriptedExecutor>, serial: Option<&str>) -> AdbClient {
        AdbClient::with_executor(
            executor.clone(),
            "adb",
            &CommandSettings::default(),
            serial.map(str::to_string),
        )
    }

    #[test]
    fn builds_primary_user_commands() {
        let executor = Arc::new(ScriptedExecutor::new());
        let client = client(&executor, None);

        let _ = client.devices("t");
        let _ = client.list_packages("t");
        let _ = client.uninstall("com.foo", "t");
        let _ = client.disable("com.foo", "t");

        assert_eq!(
            executor.calls(),
            vec![
                "devices",
                "shell pm list packages --user 0",
                "shell pm uninstall -k --user 0 com.foo",
                "shell pm disable-user --user 0 com.foo",
            ]
        );
    }

    #[test]
    fn targets_configured_serial_and_honours_keep_data() {
        let executor = Arc::new(ScriptedExecutor::new());
        let settings = CommandSettings {
            keep_data: false,
            ..CommandSettings::default()
        };
        let client =
            AdbClient::with_executor(executor.clone(), "adb", &settings, Some("ABC".to_string()));

        let _ = client.devices("t");
        let _ = client.uninstall("com.foo", "t");

        assert_eq!(
            executor.calls(),
            vec!["devices", "-s ABC shell pm uninstall --user 0 com.foo"]
        );
    }

    #[test]
    fn probe_reports_version_or_error() {
        let executor = Arc::new(
            ScriptedExecutor::new().reply("version", 0, "Android Debug Bridge version 1.0.41\n"),
        );
        let info = probe_adb(&client(&executor, None), "t");
        assert!(info.available);
        assert!(info.version_output.starts_with("Android Debug Bridge"));

        let executor = Arc::new(ScriptedExecutor::new().fail(
            "version",
            AppError::tool_not_found("adb not found", ""),
        ));
        let info = probe_adb(&client(&executor, None), "t");
        assert!(!info.available);
        assert_eq!(info.error.as_deref(), Some("adb not found"));
    }

    #[test]
    fn blank_serial_is_ignored() {
        let executor = Arc::new(ScriptedExecutor::new());
        let client = client(&executor, Some("  "));
        assert!(client.serial().is_none());
    }
}
