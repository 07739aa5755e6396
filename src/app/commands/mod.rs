use serde::Serialize;
use tauri::{AppHandle, Emitter, Manager, State};
use tracing::{info, warn};

use crate::app::adb::client::{probe_adb, AdbClient};
use crate::app::adb::locator::normalize_command_path;
use crate::app::catalog::{Category, KnownPackage, SafetyLevel};
use crate::app::config::{load_config, save_config, validate_config, AppConfig};
use crate::app::error::AppError;
use crate::app::logging::resolve_trace_id;
use crate::app::models::{AdbInfo, CommandResponse, ScanReport};
use crate::app::selection::{Filters, ReviewSummary, SelectionState};
use crate::app::session::SessionEvent;
use crate::app::state::AppState;

pub const STATUS_EVENT_NAME: &str = "debloat://status";
pub const SCAN_EVENT_NAME: &str = "debloat://scan";
pub const PACKAGE_EVENT_NAME: &str = "debloat://package";
pub const BATCH_EVENT_NAME: &str = "debloat://batch";

#[derive(Debug, Clone, Serialize)]
pub struct SelectionRow {
    #[serde(flatten)]
    pub package: &'static KnownPackage,
    pub selected: bool,
}

/// What the package list renders after every selection change.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionView {
    pub filters: Filters,
    pub rows: Vec<SelectionRow>,
    pub selected: Vec<String>,
    pub categories: Vec<Category>,
    pub installed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanEvent {
    pub trace_id: String,
    pub report: Option<ScanReport>,
    pub error: Option<AppError>,
}

pub(crate) fn selection_view(selection: &SelectionState) -> SelectionView {
    SelectionView {
        filters: selection.filters(),
        rows: selection
            .visible()
            .into_iter()
            .map(|package| SelectionRow {
                package,
                selected: selection.is_selected(package.package_name),
            })
            .collect(),
        selected: selection.selected().to_vec(),
        categories: selection.inventory().categories(),
        installed_count: selection.inventory().len(),
    }
}

pub(crate) fn event_name(event: &SessionEvent) -> &'static str {
    match event {
        SessionEvent::Status(_) => STATUS_EVENT_NAME,
        SessionEvent::ScanFinished(_) => SCAN_EVENT_NAME,
        SessionEvent::PackageProcessed(_) => PACKAGE_EVENT_NAME,
        SessionEvent::BatchFinished(_) => BATCH_EVENT_NAME,
    }
}

fn scan_event(result: Result<ScanReport, AppError>) -> ScanEvent {
    match result {
        Ok(report) => ScanEvent {
            trace_id: report.trace_id.clone(),
            report: Some(report),
            error: None,
        },
        Err(err) => ScanEvent {
            trace_id: err.trace_id.clone(),
            report: None,
            error: Some(err),
        },
    }
}

/// Applies finished scans to the selection and relays every session event to the
/// webview. Runs until the session is dropped.
pub fn spawn_event_forwarder(app: AppHandle) {
    let Some(events) = app.state::<AppState>().take_events() else {
        warn!("event forwarder already running");
        return;
    };
    let spawned = std::thread::Builder::new()
        .name("debloat-events".to_string())
        .spawn(move || {
            for event in events {
                let name = event_name(&event);
                let emitted = match event {
                    SessionEvent::Status(line) => app.emit(name, line),
                    SessionEvent::ScanFinished(result) => {
                        if let Ok(report) = &result {
                            app.state::<AppState>()
                                .selection()
                                .replace_inventory(report.bloatware.clone());
                        }
                        app.emit(name, scan_event(result))
                    }
                    SessionEvent::PackageProcessed(report) => app.emit(name, report),
                    SessionEvent::BatchFinished(summary) => app.emit(name, summary),
                };
                if let Err(err) = emitted {
                    warn!(event = name, error = %err, "failed to emit session event");
                }
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "failed to start event forwarder");
    }
}

#[tauri::command(async)]
pub fn get_config(trace_id: Option<String>) -> Result<CommandResponse<AppConfig>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let config = load_config(&trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: config,
    })
}

#[tauri::command(async)]
pub fn save_app_config(
    config: AppConfig,
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<AppConfig>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    info!(trace_id = %trace_id, "save_app_config");
    let config = validate_config(config);
    save_config(&config, &trace_id)?;
    state.session.reconfigure(AdbClient::from_config(&config));
    Ok(CommandResponse {
        trace_id,
        data: config,
    })
}

#[tauri::command(async)]
pub fn check_adb(
    command_path: Option<String>,
    trace_id: Option<String>,
) -> Result<CommandResponse<AdbInfo>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let mut config = load_config(&trace_id)?;
    if let Some(path) = command_path
        .as_deref()
        .map(normalize_command_path)
        .filter(|value| !value.is_empty())
    {
        config.adb.command_path = path;
    }
    let info = probe_adb(&AdbClient::from_config(&config), &trace_id);
    Ok(CommandResponse {
        trace_id,
        data: info,
    })
}

#[tauri::command(async)]
pub fn start_scan(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<()>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    state.session.start_scan(&trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: (),
    })
}

#[tauri::command]
pub fn list_visible(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<SelectionView>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let view = selection_view(&state.selection());
    Ok(CommandResponse {
        trace_id,
        data: view,
    })
}

#[tauri::command]
pub fn set_filters(
    filters: Filters,
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<SelectionView>, AppError> {
    update_selection(&state, trace_id, |selection| {
        selection.set_filters(filters);
        Ok(())
    })
}

#[tauri::command]
pub fn toggle_selection(
    package_name: String,
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<SelectionView>, AppError> {
    let trace = resolve_trace_id(trace_id);
    let trace_for_error = trace.clone();
    update_selection(&state, Some(trace), move |selection| {
        selection.toggle(&package_name).map(|_| ()).ok_or_else(|| {
            AppError::validation(
                format!("{package_name} is not in the visible list"),
                &trace_for_error,
            )
        })
    })
}

#[tauri::command]
pub fn select_all(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<SelectionView>, AppError> {
    update_selection(&state, trace_id, |selection| {
        selection.select_all();
        Ok(())
    })
}

#[tauri::command]
pub fn select_none(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<SelectionView>, AppError> {
    update_selection(&state, trace_id, |selection| {
        selection.select_none();
        Ok(())
    })
}

#[tauri::command]
pub fn select_by_safety(
    level: SafetyLevel,
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<SelectionView>, AppError> {
    update_selection(&state, trace_id, |selection| {
        selection.select_by_safety(level);
        Ok(())
    })
}

#[tauri::command]
pub fn review_selection(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<ReviewSummary>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let review = state
        .selection()
        .review()
        .ok_or_else(|| AppError::validation("No apps selected for processing", &trace_id))?;
    Ok(CommandResponse {
        trace_id,
        data: review,
    })
}

/// Starts the batch for the current selection. The webview calls this only after
/// the user confirmed the review.
#[tauri::command(async)]
pub fn start_processing(
    state: State<'_, AppState>,
    trace_id: Option<String>,
) -> Result<CommandResponse<usize>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    let packages = state.selection().selected().to_vec();
    let count = packages.len();
    state.session.start_batch(packages, &trace_id)?;
    Ok(CommandResponse {
        trace_id,
        data: count,
    })
}

fn update_selection(
    state: &AppState,
    trace_id: Option<String>,
    change: impl FnOnce(&mut SelectionState) -> Result<(), AppError>,
) -> Result<CommandResponse<SelectionView>, AppError> {
    let trace_id = resolve_trace_id(trace_id);
    if state.session.is_busy() {
        return Err(AppError::busy(
            "Selection is locked while a scan or batch is running",
            &trace_id,
        ));
    }
    let mut selection = state.selection();
    change(&mut selection)?;
    Ok(CommandResponse {
        trace_id,
        data: selection_view(&selection),
    })
}

#[cfg(test)]
mod tests;
