mod client;
pub mod models;

pub use client::HttpBackend;
pub use models::{AssistantReply, CalendarEventSummary};

use crate::error::BackendError;
use async_trait::async_trait;

/// The two calls the client makes against the assistant backend.
///
/// Everything else the backend does (OAuth, calendar mutation, prompting the
/// model) happens behind these calls.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Send one user message and wait for the assistant's reply
    async fn send_message(&self, message: &str) -> Result<AssistantReply, BackendError>;

    /// Fetch the current list of upcoming events; a missing list is empty
    async fn list_events(&self) -> Result<Vec<CalendarEventSummary>, BackendError>;
}
