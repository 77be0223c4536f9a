//! Per-user command session: current filter and in-progress flag.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use dsdocs_selection::{Field, SelectionFilter};
use tokio::sync::mpsc;
use tracing::trace;

use crate::command::Command;
use crate::error::BuildError;

/// Status changes for the front end's indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    FilterChanged {
        summary: String,
    },
    Busy {
        command: Command,
    },
    Done {
        command: Command,
        summary: String,
    },
    Failed {
        command: Command,
        summary: String,
        code: Option<i32>,
        message: String,
    },
}

/// Holds the selection that persists between commands and guards
/// against overlapping runs.
pub struct Session {
    filter: Mutex<SelectionFilter>,
    running: AtomicBool,
    events_tx: mpsc::Sender<StatusEvent>,
    events_rx: Option<mpsc::Receiver<StatusEvent>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SelectionFilter::any())
    }
}

impl Session {
    pub fn new(filter: SelectionFilter) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            filter: Mutex::new(filter),
            running: AtomicBool::new(false),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<StatusEvent>> {
        self.events_rx.take()
    }

    pub fn filter(&self) -> SelectionFilter {
        match self.filter.lock() {
            Ok(f) => f.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replaces the whole filter and publishes the new summary.
    pub fn set_filter(&self, filter: SelectionFilter) {
        let summary = filter.summary();
        match self.filter.lock() {
            Ok(mut f) => *f = filter,
            Err(poisoned) => *poisoned.into_inner() = filter,
        }
        self.publish(StatusEvent::FilterChanged { summary });
    }

    pub fn set_field(&self, field: Field, value: impl Into<String>) {
        self.set_filter(self.filter().with(field, value));
    }

    pub fn clear_filter(&self) {
        self.set_filter(SelectionFilter::any());
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Marks a command as running. Rejected while another one is.
    ///
    /// The flag is cleared when the returned guard drops.
    pub fn begin(&self, command: Command) -> Result<BusyGuard<'_>, BuildError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BuildError::AlreadyRunning)?;
        self.publish(StatusEvent::Busy { command });
        Ok(BusyGuard {
            session: self,
            command,
        })
    }

    pub(crate) fn publish(&self, event: StatusEvent) {
        if let Err(e) = self.events_tx.try_send(event) {
            trace!(error = %e, "status event dropped");
        }
    }
}

/// Running-state token handed out by [`Session::begin`].
pub struct BusyGuard<'a> {
    session: &'a Session,
    command: Command,
}

impl BusyGuard<'_> {
    pub fn command(&self) -> Command {
        self.command
    }

    /// Publishes the final status for the command and releases the session.
    pub fn finish<T>(self, filter: &SelectionFilter, result: &Result<T, BuildError>) {
        let summary = filter.summary();
        let event = match result {
            Ok(_) => StatusEvent::Done {
                command: self.command,
                summary,
            },
            Err(e) => StatusEvent::Failed {
                command: self.command,
                summary,
                code: e.exit_code(),
                message: e.to_string(),
            },
        };
        self.session.publish(event);
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.session.running.store(false, Ordering::Release);
    }
}
