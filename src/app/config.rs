use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::adb::runner::CommandLimits;
use crate::app::error::AppError;

pub const CONFIG_PATH_ENV: &str = "APP_DEBLOATER_CONFIG_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdbSettings {
    pub command_path: String,
    /// Passed as `-s <serial>` when several devices are attached.
    pub serial: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandSettings {
    pub timeout_secs: u64,
    pub terminate_grace_secs: u64,
    pub user_id: u32,
    pub keep_data: bool,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            terminate_grace_secs: 5,
            user_id: 0,
            keep_data: true,
        }
    }
}

impl CommandSettings {
    pub fn limits(&self) -> CommandLimits {
        CommandLimits {
            timeout: Duration::from_secs(self.timeout_secs),
            terminate_grace: Duration::from_secs(self.terminate_grace_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiSettings {
    pub window_width: i32,
    pub window_height: i32,
    /// Ask before processing even when only SAFE packages are selected.
    pub confirm_safe_batches: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            window_width: 900,
            window_height: 650,
            confirm_safe_batches: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub adb: AdbSettings,
    #[serde(default)]
    pub command: CommandSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    home_dir().join(".app_debloater_config.json")
}

pub fn backup_config_path() -> PathBuf {
    home_dir().join(".app_debloater_config.backup.json")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_config(trace_id: &str) -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path(), trace_id)
}

pub fn save_config(config: &AppConfig, trace_id: &str) -> Result<(), AppError> {
    save_config_to_path(config, &config_path(), &backup_config_path(), trace_id)
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::config(format!("Failed to read config: {err}"), trace_id))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::config(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(
    config: &AppConfig,
    path: &Path,
    backup_path: &Path,
    trace_id: &str,
) -> Result<(), AppError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|err| AppError::config(format!("Failed to create config dir: {err}"), trace_id))?;
    if path.exists() {
        let _ = fs::copy(path, backup_path);
    }
    let payload = serde_json::to_string_pretty(&validate_config(config.clone()))
        .map_err(|err| AppError::config(format!("Failed to serialize config: {err}"), trace_id))?;

    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .map_err(|err| AppError::config(format!("Failed to stage config: {err}"), trace_id))?;
    staged
        .write_all(payload.as_bytes())
        .map_err(|err| AppError::config(format!("Failed to write config: {err}"), trace_id))?;
    staged
        .persist(path)
        .map_err(|err| AppError::config(format!("Failed to write config: {}", err.error), trace_id))?;
    Ok(())
}

pub fn validate_config(mut config: AppConfig) -> AppConfig {
    let defaults = CommandSettings::default();
    if !(1..=600).contains(&config.command.timeout_secs) {
        config.command.timeout_secs = defaults.timeout_secs;
    }
    if !(1..=60).contains(&config.command.terminate_grace_secs) {
        config.command.terminate_grace_secs = defaults.terminate_grace_secs;
    }
    if config
        .adb
        .serial
        .as_deref()
        .is_some_and(|serial| serial.trim().is_empty())
    {
        config.adb.serial = None;
    }
    if config.logging.log_level.trim().is_empty() {
        config.logging.log_level = LoggingSettings::default().log_level;
    }
    config
}
