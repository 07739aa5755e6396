use serde::Serialize;
use std::fmt;

pub const ERR_VALIDATION: &str = "ERR_VALIDATION";
pub const ERR_TOOL_NOT_FOUND: &str = "ERR_TOOL_NOT_FOUND";
pub const ERR_TIMEOUT: &str = "ERR_TIMEOUT";
pub const ERR_SYSTEM: &str = "ERR_SYSTEM";
pub const ERR_CONNECTIVITY: &str = "ERR_CONNECTIVITY";
pub const ERR_COMMAND_FAILED: &str = "ERR_COMMAND_FAILED";
pub const ERR_NO_MATCH: &str = "ERR_NO_MATCH";
pub const ERR_BUSY: &str = "ERR_BUSY";
pub const ERR_CONFIG: &str = "ERR_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppError {
    pub error: String,
    pub code: String,
    pub trace_id: String,
    /// Text the bridge printed before the failure was detected, when any was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_output: Option<String>,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            trace_id: trace_id.into(),
            partial_output: None,
        }
    }

    pub fn validation(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_VALIDATION, message, trace_id)
    }

    pub fn tool_not_found(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_TOOL_NOT_FOUND, message, trace_id)
    }

    pub fn timeout(
        message: impl Into<String>,
        partial_output: String,
        trace_id: impl Into<String>,
    ) -> Self {
        Self::new(ERR_TIMEOUT, message, trace_id).with_output(partial_output)
    }

    pub fn system(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_SYSTEM, message, trace_id)
    }

    pub fn connectivity(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_CONNECTIVITY, message, trace_id)
    }

    pub fn command_failed(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_COMMAND_FAILED, message, trace_id)
    }

    pub fn no_match(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_NO_MATCH, message, trace_id)
    }

    pub fn busy(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_BUSY, message, trace_id)
    }

    pub fn config(message: impl Into<String>, trace_id: impl Into<String>) -> Self {
        Self::new(ERR_CONFIG, message, trace_id)
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        let output = output.into();
        self.partial_output = if output.trim().is_empty() {
            None
        } else {
            Some(output)
        };
        self
    }

    pub fn is_connectivity(&self) -> bool {
        self.code == ERR_CONNECTIVITY
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_output_is_not_attached() {
        let err = AppError::timeout("timed out", "  \n".to_string(), "trace-1");
        assert_eq!(err.code, ERR_TIMEOUT);
        assert!(err.partial_output.is_none());

        let err = AppError::command_failed("failed", "trace-2").with_output("Error: boom");
        assert_eq!(err.partial_output.as_deref(), Some("Error: boom"));
    }

    #[test]
    fn serializes_without_empty_output() {
        let value = serde_json::to_value(AppError::busy("scan running", "t")).expect("json");
        assert_eq!(value["code"], "ERR_BUSY");
        assert!(value.get("partial_output").is_none());
    }
}
