use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::app::error::AppError;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const MAX_PENDING_LINE: usize = 64 * 1024;

/// Result of a process that ran to completion. `output` holds stdout and stderr
/// interleaved in the order the chunks arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn exited_cleanly(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLimits {
    pub timeout: Duration,
    /// How long a child gets to exit after the polite termination request.
    pub terminate_grace: Duration,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_COMMAND_TIMEOUT,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
        }
    }
}

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

pub fn run_command_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    let limits = CommandLimits {
        timeout,
        ..CommandLimits::default()
    };
    run_command_with_limits(program, args, limits, trace_id)
}

pub fn run_command_with_limits(
    program: &str,
    args: &[String],
    limits: CommandLimits,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    debug!(trace_id = %trace_id, program = %program, args = ?args, "spawning command");

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = command
        .spawn()
        .map_err(|err| spawn_error(program, &err, trace_id))?;

    // Both streams land in one buffer. Draining them on their own threads also keeps a
    // chatty child from blocking on a full pipe.
    let buffer = SharedBuffer::default();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_drain(stdout, Arc::clone(&buffer)));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_drain(stderr, Arc::clone(&buffer)));
    }

    let start = Instant::now();
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {
                if start.elapsed() >= limits.timeout {
                    terminate_child(&mut child, limits.terminate_grace, trace_id);
                    join_readers(readers, limits.terminate_grace);
                    let partial = snapshot(&buffer);
                    warn!(
                        trace_id = %trace_id,
                        program = %program,
                        timeout_secs = limits.timeout.as_secs(),
                        partial_bytes = partial.len(),
                        "command timed out"
                    );
                    return Err(AppError::timeout(
                        format!(
                            "Command timed out after {}s: {} {}",
                            limits.timeout.as_secs(),
                            program,
                            args.join(" ")
                        ),
                        partial,
                        trace_id,
                    ));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                join_readers(readers, limits.terminate_grace);
                return Err(
                    AppError::system(format!("Failed to poll command: {err}"), trace_id)
                        .with_output(snapshot(&buffer)),
                );
            }
        }
    };

    // A grandchild (e.g. a freshly started adb server) may inherit the pipes, so the
    // readers only get a bounded wait after the direct child has exited.
    join_readers(readers, limits.terminate_grace);
    let output = snapshot(&buffer);
    debug!(
        trace_id = %trace_id,
        exit_code = ?exit_code,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "command finished"
    );

    Ok(CommandOutput { output, exit_code })
}

fn spawn_error(program: &str, err: &std::io::Error, trace_id: &str) -> AppError {
    if err.kind() == ErrorKind::NotFound {
        AppError::tool_not_found(
            format!("'{program}' not found. Ensure ADB is installed and in your system PATH."),
            trace_id,
        )
    } else {
        AppError::system(format!("Failed to spawn command: {err}"), trace_id)
    }
}

fn spawn_drain<R>(reader: R, buffer: SharedBuffer) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut reader = reader;
        let mut temp = [0u8; 4096];
        // Each stream is appended a whole line at a time so the other stream can never
        // land inside a multi-byte character.
        let mut pending = Vec::new();
        loop {
            match reader.read(&mut temp) {
                Ok(0) => break,
                Ok(count) => {
                    pending.extend_from_slice(&temp[..count]);
                    let ready = take_flushable(&mut pending);
                    if !ready.is_empty() {
                        append(&buffer, &ready);
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        if !pending.is_empty() {
            append(&buffer, &pending);
        }
    })
}

/// Splits off the complete lines at the front of `pending`. A line longer than
/// `MAX_PENDING_LINE` is released early, cut at a character boundary.
fn take_flushable(pending: &mut Vec<u8>) -> Vec<u8> {
    let cut = match pending.iter().rposition(|byte| *byte == b'\n') {
        Some(newline) => newline + 1,
        None if pending.len() >= MAX_PENDING_LINE => match std::str::from_utf8(pending) {
            Ok(_) => pending.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => pending.len(),
        },
        None => 0,
    };
    let rest = pending.split_off(cut);
    std::mem::replace(pending, rest)
}

fn append(buffer: &SharedBuffer, bytes: &[u8]) {
    buffer
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .extend_from_slice(bytes);
}

fn join_readers(readers: Vec<JoinHandle<()>>, wait: Duration) {
    let deadline = Instant::now() + wait;
    for handle in readers {
        while !handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(POLL_INTERVAL);
        }
        if handle.is_finished() {
            let _ = handle.join();
        }
    }
}

fn snapshot(buffer: &SharedBuffer) -> String {
    let guard = buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    String::from_utf8_lossy(&guard).into_owned()
}

fn terminate_child(child: &mut Child, grace: Duration, trace_id: &str) {
    if request_terminate(child) {
        let start = Instant::now();
        while start.elapsed() < grace {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(_) => break,
            }
        }
        warn!(trace_id = %trace_id, pid = child.id(), "child ignored termination request, killing");
    }
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn request_terminate(child: &mut Child) -> bool {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return false;
    };
    // SAFETY: the pid belongs to our own child, which has not been reaped yet.
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn request_terminate(child: &mut Child) -> bool {
    child.kill().is_ok()
}
