use std::path::Path;

use crate::app::error::AppError;

pub const ADB_PATH_ENV: &str = "APP_DEBLOATER_ADB";
const DEFAULT_ADB_PROGRAM: &str = "adb";

pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|candidate| candidate.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Picks the adb binary: environment override, then the configured path, then `adb`
/// from PATH.
pub fn resolve_adb_program(config_command_path: &str) -> String {
    let from_env = std::env::var(ADB_PATH_ENV)
        .map(|value| normalize_command_path(&value))
        .unwrap_or_default();
    if !from_env.is_empty() {
        return from_env;
    }
    let configured = normalize_command_path(config_command_path);
    if configured.is_empty() {
        DEFAULT_ADB_PROGRAM.to_string()
    } else {
        configured
    }
}

/// Bare program names are left for the OS to find on PATH; explicit paths must exist.
pub fn validate_adb_program(program: &str, trace_id: &str) -> Result<(), AppError> {
    if program.trim().is_empty() {
        return Err(AppError::validation("ADB command is empty", trace_id));
    }
    let path = Path::new(program);
    if path.components().count() <= 1 {
        return Ok(());
    }
    if path.is_dir() {
        return Err(AppError::validation(
            "ADB path must point to an executable file",
            trace_id,
        ));
    }
    if !path.exists() {
        return Err(AppError::tool_not_found(
            format!("ADB executable not found at {program}"),
            trace_id,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::error::{ERR_TOOL_NOT_FOUND, ERR_VALIDATION};

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(
            normalize_command_path("  \"/opt/android/platform-tools/adb\"  "),
            "/opt/android/platform-tools/adb"
        );
        assert_eq!(
            normalize_command_path("  '/opt/android/platform-tools/adb'  "),
            "/opt/android/platform-tools/adb"
        );
    }

    #[test]
    fn validates_paths() {
        assert!(validate_adb_program("adb", "t").is_ok());
        let err = validate_adb_program("/this/path/should/not/exist/adb", "t").unwrap_err();
        assert_eq!(err.code, ERR_TOOL_NOT_FOUND);
        let dir = tempfile::tempdir().expect("tempdir");
        let err = validate_adb_program(dir.path().to_str().expect("utf8"), "t").unwrap_err();
        assert_eq!(err.code, ERR_VALIDATION);
    }
}
