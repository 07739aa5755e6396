use std::sync::Mutex;

use crate::app::adb::client::AdbExecutor;
use crate::app::adb::runner::{CommandLimits, CommandOutput};
use crate::app::error::AppError;

type Reply = Result<CommandOutput, AppError>;

/// Executor that answers from canned replies and records every command line.
/// A rule matches when the space-joined arguments contain its pattern; the first
/// matching rule wins. Unmatched commands exit 0 with no output.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Mutex<Vec<(String, Reply)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, pattern: &str, exit_code: i32, output: &str) -> Self {
        self.push(
            pattern,
            Ok(CommandOutput {
                output: output.to_string(),
                exit_code: Some(exit_code),
            }),
        )
    }

    pub fn fail(self, pattern: &str, error: AppError) -> Self {
        self.push(pattern, Err(error))
    }

    fn push(self, pattern: &str, reply: Reply) -> Self {
        self.rules
            .lock()
            .expect("rules lock")
            .push((pattern.to_string(), reply));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count_calls(&self, pattern: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.contains(pattern))
            .count()
    }
}

impl AdbExecutor for ScriptedExecutor {
    fn execute(
        &self,
        args: &[String],
        _limits: CommandLimits,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        let line = args.join(" ");
        self.calls.lock().expect("calls lock").push(line.clone());
        let rules = self.rules.lock().expect("rules lock");
        match rules.iter().find(|(pattern, _)| line.contains(pattern.as_str())) {
            Some((_, Ok(output))) => Ok(output.clone()),
            Some((_, Err(err))) => {
                let mut err = err.clone();
                err.trace_id = trace_id.to_string();
                Err(err)
            }
            None => Ok(CommandOutput {
                output: String::new(),
                exit_code: Some(0),
            }),
        }
    }
}

pub const DEVICES_OK: &str = "List of devices attached\n1234\tdevice\n";
