mod handle;
pub mod models;
mod scheduler;
pub mod time;

pub use handle::EventsPanelHandle;
pub use models::{EventRow, Notice, PanelState};
pub use scheduler::start_poller;
pub use time::EventDisplay;

use crate::components::backend::{Backend, CalendarEventSummary};
use crate::error::BackendError;
use rust_i18n::t;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How a single refresh ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Populated(usize),
    Empty,
    ServerError,
    TransportError,
    /// A newer refresh started before this one finished; its result was dropped
    Superseded,
}

/// Sidebar list of upcoming events.
///
/// Every refresh takes a sequence token. Only the response belonging to the
/// newest token may replace the panel contents, so a slow earlier fetch can
/// never overwrite a newer one.
pub struct EventsPanel {
    backend: Arc<dyn Backend>,
    display: EventDisplay,
    sequence: AtomicU64,
    state: watch::Sender<PanelState>,
}

impl EventsPanel {
    pub fn new(backend: Arc<dyn Backend>, display: EventDisplay) -> Self {
        let (state, _) = watch::channel(PanelState::Loading);
        Self {
            backend,
            display,
            sequence: AtomicU64::new(0),
            state,
        }
    }

    fn row(&self, event: &CalendarEventSummary) -> EventRow {
        EventRow {
            time: self
                .display
                .format_start(event.start.as_deref().unwrap_or_default()),
            title: event
                .summary
                .clone()
                .unwrap_or_else(|| t!("events_untitled").to_string()),
        }
    }

    /// Show the loading indicator, fetch the events and render the result
    pub async fn refresh(&self) -> RefreshOutcome {
        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_replace(PanelState::Loading);
        debug!("Refreshing events (request {})", token);

        let (next, outcome) = match self.backend.list_events().await {
            Ok(events) if events.is_empty() => (PanelState::Empty, RefreshOutcome::Empty),
            Ok(events) => {
                let rows: Vec<EventRow> = events.iter().map(|event| self.row(event)).collect();
                let count = rows.len();
                (PanelState::Populated(rows), RefreshOutcome::Populated(count))
            }
            Err(BackendError::Server { message, .. }) => (
                PanelState::Errored(
                    message.unwrap_or_else(|| t!("events_error_fallback").to_string()),
                ),
                RefreshOutcome::ServerError,
            ),
            Err(BackendError::Transport(error)) => (
                PanelState::Errored(t!("events_transport_error", error = error).to_string()),
                RefreshOutcome::TransportError,
            ),
        };

        let applied = self.state.send_if_modified(|state| {
            if self.sequence.load(Ordering::SeqCst) != token {
                return false;
            }
            *state = next;
            true
        });

        if applied {
            info!("Events panel updated: {:?}", outcome);
            outcome
        } else {
            warn!("Discarding stale events response (request {})", token);
            RefreshOutcome::Superseded
        }
    }

    pub fn state(&self) -> PanelState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.state.subscribe()
    }
}
