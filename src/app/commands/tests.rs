use super::*;

use crate::app::catalog::lookup;
use crate::app::error::ERR_CONNECTIVITY;
use crate::app::models::{BatchSummary, StatusLine};

fn selection_with(names: &[&str]) -> SelectionState {
    let mut selection = SelectionState::new();
    selection.replace_inventory(names.iter().filter_map(|name| lookup(name)).collect());
    selection
}

#[test]
fn selection_view_marks_selected_rows() {
    let mut selection = selection_with(&["com.facebook.katana", "com.xiaomi.xmsf"]);
    selection.toggle("com.xiaomi.xmsf");

    let view = selection_view(&selection);
    let rows: Vec<_> = view
        .rows
        .iter()
        .map(|row| (row.package.package_name, row.selected))
        .collect();
    assert_eq!(
        rows,
        vec![("com.facebook.katana", false), ("com.xiaomi.xmsf", true)]
    );
    assert_eq!(view.selected, vec!["com.xiaomi.xmsf".to_string()]);
    assert_eq!(view.categories, vec![Category::Facebook, Category::Xiaomi]);
    assert_eq!(view.installed_count, 2);
}

#[test]
fn selection_rows_serialize_flat() {
    let selection = selection_with(&["com.facebook.katana"]);
    let value = serde_json::to_value(selection_view(&selection)).expect("json");
    let row = &value["rows"][0];
    assert_eq!(row["package_name"], "com.facebook.katana");
    assert_eq!(row["safety"], "SAFE");
    assert_eq!(row["selected"], false);
}

#[test]
fn session_events_map_to_channel_names() {
    assert_eq!(
        event_name(&SessionEvent::Status(StatusLine::new("t", "hi"))),
        STATUS_EVENT_NAME
    );
    assert_eq!(
        event_name(&SessionEvent::BatchFinished(BatchSummary::new("t"))),
        BATCH_EVENT_NAME
    );
}

#[test]
fn failed_scan_event_carries_error_trace() {
    let event = scan_event(Err(AppError::connectivity("no device", "t-scan")));
    assert_eq!(event.trace_id, "t-scan");
    assert!(event.report.is_none());
    assert_eq!(event.error.map(|err| err.code), Some(ERR_CONNECTIVITY.to_string()));
}
