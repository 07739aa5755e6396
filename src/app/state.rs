use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard};

use crate::app::adb::client::AdbClient;
use crate::app::selection::SelectionState;
use crate::app::session::{Session, SessionEvent};

pub struct AppState {
    pub session: Session,
    selection: Mutex<SelectionState>,
    events: Mutex<Option<Receiver<SessionEvent>>>,
}

impl AppState {
    pub fn new(client: AdbClient) -> Self {
        let (session, events) = Session::new(client);
        Self {
            session,
            selection: Mutex::new(SelectionState::new()),
            events: Mutex::new(Some(events)),
        }
    }

    pub fn selection(&self) -> MutexGuard<'_, SelectionState> {
        self.selection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hands the session's event receiver to the forwarding thread. Only the first
    /// caller gets it.
    pub fn take_events(&self) -> Option<Receiver<SessionEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}
