use super::{EventDisplay, EventsPanel, PanelState, RefreshOutcome};
use crate::components::backend::Backend;
use crate::error::ChatResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Handle for interacting with the events panel.
///
/// Cheap to clone; the chat controller, the poller and the terminal session
/// all hold one and may refresh independently.
#[derive(Clone)]
pub struct EventsPanelHandle {
    panel: Arc<EventsPanel>,
}

impl EventsPanelHandle {
    pub fn new(backend: Arc<dyn Backend>, display: EventDisplay) -> Self {
        Self {
            panel: Arc::new(EventsPanel::new(backend, display)),
        }
    }

    /// Refresh now and wait for the result
    pub async fn refresh(&self) -> RefreshOutcome {
        self.panel.refresh().await
    }

    /// Refresh after `delay` without waiting for it
    pub fn refresh_after(&self, delay: Duration) -> JoinHandle<RefreshOutcome> {
        let panel = Arc::clone(&self.panel);
        tokio::spawn(async move {
            sleep(delay).await;
            panel.refresh().await
        })
    }

    /// Snapshot of what the panel currently shows
    pub fn state(&self) -> PanelState {
        self.panel.state()
    }

    /// Receive every state the panel moves through
    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.panel.subscribe()
    }

    pub fn render_html(&self) -> ChatResult<String> {
        self.panel.state().render_html()
    }
}
