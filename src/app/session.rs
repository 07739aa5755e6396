//! Runs scans and removal batches off the UI thread, one at a time.
//!
//! Workers only talk back through [`SessionEvent`]s on an mpsc channel; whichever
//! thread owns the UI drains the receiver and applies them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{error, info};

use crate::app::adb::client::AdbClient;
use crate::app::error::AppError;
use crate::app::inventory;
use crate::app::models::{BatchSummary, PackageReport, ScanReport, StatusLine};
use crate::app::removal;

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Status(StatusLine),
    ScanFinished(Result<ScanReport, AppError>),
    PackageProcessed(PackageReport),
    BatchFinished(BatchSummary),
}

pub struct Session {
    client: Mutex<AdbClient>,
    busy: Arc<AtomicBool>,
    events: Sender<SessionEvent>,
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone)]
struct Poster {
    events: Sender<SessionEvent>,
    trace_id: String,
}

impl Poster {
    fn status(&self, message: impl Into<String>) {
        self.post(SessionEvent::Status(StatusLine::new(&self.trace_id, message)));
    }

    // The receiver disappears when the UI shuts down mid-run; nothing left to tell.
    fn post(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

impl Session {
    pub fn new(client: AdbClient) -> (Self, Receiver<SessionEvent>) {
        let (events, receiver) = mpsc::channel();
        let session = Self {
            client: Mutex::new(client),
            busy: Arc::new(AtomicBool::new(false)),
            events,
        };
        (session, receiver)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Takes effect for the next scan or batch.
    pub fn reconfigure(&self, client: AdbClient) {
        *self.client.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = client;
    }

    pub fn client(&self) -> AdbClient {
        self.client
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn claim(&self, trace_id: &str) -> Result<BusyGuard, AppError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| BusyGuard(Arc::clone(&self.busy)))
            .map_err(|_| AppError::busy("A scan or removal batch is already running", trace_id))
    }

    fn poster(&self, trace_id: &str) -> Poster {
        Poster {
            events: self.events.clone(),
            trace_id: trace_id.to_string(),
        }
    }

    pub fn start_scan(&self, trace_id: &str) -> Result<JoinHandle<()>, AppError> {
        let guard = self.claim(trace_id)?;
        let client = self.client();
        let poster = self.poster(trace_id);
        let worker_trace_id = trace_id.to_string();
        info!(trace_id = %trace_id, "scan started");

        let handle = std::thread::Builder::new()
            .name("debloat-scan".to_string())
            .spawn(move || {
                poster.status("--- Starting Scan Process ---");
                let result =
                    inventory::scan(&client, &worker_trace_id, &mut |line| poster.status(line))
                        .map_err(|failure| {
                            let err = &failure.error;
                            error!(
                                trace_id = %worker_trace_id,
                                stage = ?failure.stage,
                                code = %err.code,
                                error = %err.error,
                                "scan failed"
                            );
                            poster.status(format!("Error: {}", err.error));
                            if let Some(partial) = &err.partial_output {
                                poster.status(format!("ADB Output:\n{}", partial.trim()));
                            }
                            poster.status(failure.advice());
                            failure.error
                        });
                drop(guard);
                poster.post(SessionEvent::ScanFinished(result));
            })
            .map_err(|err| {
                AppError::system(format!("Failed to start scan worker: {err}"), trace_id)
            })?;
        Ok(handle)
    }

    /// Processes `packages` in order on a worker thread.
    pub fn start_batch(
        &self,
        packages: Vec<String>,
        trace_id: &str,
    ) -> Result<JoinHandle<()>, AppError> {
        if packages.is_empty() {
            return Err(AppError::validation("No apps selected for processing", trace_id));
        }
        let guard = self.claim(trace_id)?;
        let client = self.client();
        let poster = self.poster(trace_id);
        let worker_trace_id = trace_id.to_string();
        info!(trace_id = %trace_id, count = packages.len(), "batch started");

        let handle = std::thread::Builder::new()
            .name("debloat-batch".to_string())
            .spawn(move || {
                poster.status("--- Starting Removal/Disabling Process ---");
                let summary = removal::process_batch(&client, &packages, &worker_trace_id, &mut |report| {
                    poster.status(format!("Processing package: {}", report.package_name));
                    for line in report.status_lines() {
                        poster.status(line);
                    }
                    poster.post(SessionEvent::PackageProcessed(report.clone()));
                });
                poster.status(format!(
                    "--- Process finished: {} uninstalled, {} disabled, {} failed ---",
                    summary.uninstalled, summary.disabled, summary.failed
                ));
                poster.status("Apps reported as 'UNINSTALLED' or 'DISABLED' should no longer appear in your app drawer. Consider restarting your phone.");
                drop(guard);
                poster.post(SessionEvent::BatchFinished(summary));
            })
            .map_err(|err| {
                AppError::system(format!("Failed to start batch worker: {err}"), trace_id)
            })?;
        Ok(handle)
    }
}
