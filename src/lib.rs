pub mod app;

#[cfg(feature = "desktop")]
use app::commands::{
    check_adb, get_config, list_visible, review_selection, save_app_config, select_all,
    select_by_safety, select_none, set_filters, spawn_event_forwarder, start_processing,
    start_scan, toggle_selection,
};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;
    use tracing::warn;

    use app::adb::client::AdbClient;
    use app::config::{load_config, AppConfig};
    use app::logging::{init_logging_with_level, resolve_trace_id};
    use app::state::AppState;

    let trace_id = resolve_trace_id(None);
    let (config, load_error) = match load_config(&trace_id) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    init_logging_with_level(&config.logging.log_level);
    if let Some(err) = load_error {
        warn!(trace_id = %trace_id, error = %err, "config unreadable, using defaults");
    }

    let window_size = tauri::LogicalSize::new(
        f64::from(config.ui.window_width),
        f64::from(config.ui.window_height),
    );
    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .manage(AppState::new(AdbClient::from_config(&config)))
        .setup(move |app| {
            if let Some(window) = app.get_webview_window("main") {
                if let Err(err) = window.set_size(window_size) {
                    warn!(error = %err, "failed to size main window");
                }
            }
            spawn_event_forwarder(app.handle().clone());
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_config,
            save_app_config,
            check_adb,
            start_scan,
            list_visible,
            set_filters,
            toggle_selection,
            select_all,
            select_none,
            select_by_safety,
            review_selection,
            start_processing
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
