use super::composer::{Composer, SubmitButton};
use super::transcript::{ChatMessage, Transcript};
use crate::components::backend::Backend;
use crate::components::events_panel::EventsPanelHandle;
use crate::error::{BackendError, ChatResult};
use rust_i18n::t;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How a call to [`ChatController::submit`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty after trimming; nothing happened
    Ignored,
    /// Another message was still in flight; nothing happened
    Busy,
    Replied,
    ServerError,
    TransportError,
}

/// Mediates one chat turn at a time between the user and the backend.
///
/// Every change to the transcript or the composer bumps a revision number on
/// a watch channel, so a front-end can re-render while a reply is pending.
pub struct ChatController {
    backend: Arc<dyn Backend>,
    transcript: Mutex<Transcript>,
    composer: Mutex<Composer>,
    in_flight: AtomicBool,
    revision: watch::Sender<u64>,
    events: Option<EventsPanelHandle>,
    refresh_delay: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Re-enables the composer and clears the in-flight flag on every exit from
/// `submit`, including a cancelled or panicking request.
struct SendGuard<'a> {
    controller: &'a ChatController,
}

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        lock(&self.controller.composer).button.finish_sending();
        self.controller.in_flight.store(false, Ordering::Release);
        self.controller.changed();
    }
}

impl ChatController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            backend,
            transcript: Mutex::new(Transcript::new()),
            composer: Mutex::new(Composer::default()),
            in_flight: AtomicBool::new(false),
            revision,
            events: None,
            refresh_delay: Duration::ZERO,
        }
    }

    /// Refresh `events` `delay` after every successful reply
    pub fn with_events_panel(mut self, events: EventsPanelHandle, delay: Duration) -> Self {
        self.events = Some(events);
        self.refresh_delay = delay;
        self
    }

    fn changed(&self) {
        self.revision.send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    fn append(&self, message: ChatMessage) {
        lock(&self.transcript).append(message);
        self.changed();
    }

    fn schedule_events_refresh(&self) {
        if let Some(events) = &self.events {
            debug!("Scheduling events refresh in {:?}", self.refresh_delay);
            // Fire and forget; the chat turn never waits for the events fetch
            let _ = events.refresh_after(self.refresh_delay);
        }
    }

    /// Send one message and append the user turn and the assistant turn.
    ///
    /// Every failure ends up in the transcript as an assistant turn; nothing
    /// is returned as an error.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        let message = text.trim();
        if message.is_empty() {
            debug!("Ignoring empty message");
            return SubmitOutcome::Ignored;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Message submitted while a previous one is still in flight");
            return SubmitOutcome::Busy;
        }

        {
            let mut composer = lock(&self.composer);
            composer.draft.clear();
            composer.button.begin_sending();
        }
        let _guard = SendGuard { controller: self };
        self.append(ChatMessage::user(message));

        match self.backend.send_message(message).await {
            Ok(reply) => {
                info!("Received assistant reply ({} bytes)", reply.text.len());
                self.append(ChatMessage::assistant(reply.text).with_timestamp(reply.timestamp));
                self.schedule_events_refresh();
                SubmitOutcome::Replied
            }
            Err(BackendError::Server { status, message }) => {
                warn!("Assistant backend returned HTTP {}", status);
                let text = message.unwrap_or_else(|| t!("chat_error_fallback").to_string());
                self.append(ChatMessage::assistant(text));
                SubmitOutcome::ServerError
            }
            Err(BackendError::Transport(error)) => {
                warn!("Could not reach assistant backend: {}", error);
                self.append(ChatMessage::assistant(t!("chat_transport_error", error = error)));
                SubmitOutcome::TransportError
            }
        }
    }

    /// Submit whatever is in the input field
    pub async fn submit_draft(&self) -> SubmitOutcome {
        let draft = lock(&self.composer).draft.clone();
        self.submit(&draft).await
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        lock(&self.composer).draft = text.into();
        self.changed();
    }

    /// Receive a new revision number after every transcript or composer change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn draft(&self) -> String {
        lock(&self.composer).draft.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn submit_button(&self) -> SubmitButton {
        lock(&self.composer).button.clone()
    }

    pub fn transcript(&self) -> Transcript {
        lock(&self.transcript).clone()
    }

    /// Messages appended at or after `index`
    pub fn messages_since(&self, index: usize) -> Vec<ChatMessage> {
        lock(&self.transcript).since(index).to_vec()
    }

    pub fn render_html(&self) -> ChatResult<String> {
        lock(&self.transcript).render_html()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::backend::{AssistantReply, CalendarEventSummary};
    use crate::components::chat::{ButtonLabel, Role};
    use crate::components::events_panel::PanelState;
    use crate::components::page::render_page;
    use crate::components::events_panel::EventDisplay;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::{oneshot, Notify};

    /// In-memory backend returning a fixed reply and counting calls
    struct MockBackend {
        reply: Result<AssistantReply, BackendError>,
        events: Vec<CalendarEventSummary>,
        messages: Mutex<Vec<String>>,
        event_fetches: AtomicUsize,
    }

    impl MockBackend {
        fn replying(reply: Result<AssistantReply, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                events: vec![CalendarEventSummary::new("2024-01-01T10:00:00Z", "Standup")],
                messages: Mutex::new(Vec::new()),
                event_fetches: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Backend for MockBackend {
        async fn send_message(&self, message: &str) -> Result<AssistantReply, BackendError> {
            self.messages.lock().unwrap().push(message.to_string());
            self.reply.clone()
        }

        async fn list_events(&self) -> Result<Vec<CalendarEventSummary>, BackendError> {
            self.event_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.events.clone())
        }
    }

    /// Backend that holds the reply until the test releases it
    struct HeldBackend {
        started: Notify,
        release: Mutex<Option<oneshot::Receiver<Result<AssistantReply, BackendError>>>>,
    }

    #[async_trait]
    impl Backend for HeldBackend {
        async fn send_message(&self, _message: &str) -> Result<AssistantReply, BackendError> {
            let release = self.release.lock().unwrap().take();
            self.started.notify_one();
            match release {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(BackendError::Transport("released twice".to_string()))),
                None => Err(BackendError::Transport("no reply queued".to_string())),
            }
        }

        async fn list_events(&self) -> Result<Vec<CalendarEventSummary>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_successful_turn() {
        let backend = MockBackend::replying(Ok(AssistantReply::new("Your day:\n- Standup")));
        let chat = ChatController::new(backend.clone());
        chat.set_draft("  what's on today?  ");

        assert_eq!(chat.submit_draft().await, SubmitOutcome::Replied);

        let transcript = chat.transcript();
        assert_eq!(
            transcript.messages(),
            &[
                ChatMessage::user("what's on today?"),
                ChatMessage::assistant("Your day:\n- Standup"),
            ]
        );
        assert_eq!(*backend.messages.lock().unwrap(), vec!["what's on today?".to_string()]);
        assert!(chat.draft().is_empty());
        assert!(chat.render_html().unwrap().contains("Your day:<br>• Standup"));

        let button = chat.submit_button();
        assert!(button.is_enabled());
        assert_eq!(button.label(), ButtonLabel::Send);
        assert_eq!(button.enable_count(), 1);
        assert!(!chat.is_in_flight());
    }

    #[tokio::test]
    async fn test_empty_input_is_ignored() {
        let backend = MockBackend::replying(Ok(AssistantReply::new("unused")));
        let chat = ChatController::new(backend.clone());

        for input in ["", "   ", "\n\t "] {
            assert_eq!(chat.submit(input).await, SubmitOutcome::Ignored);
        }

        assert!(chat.transcript().is_empty());
        assert!(backend.messages.lock().unwrap().is_empty());
        assert_eq!(chat.submit_button().enable_count(), 0);
    }

    #[tokio::test]
    async fn test_server_error_uses_backend_text() {
        let backend = MockBackend::replying(Err(BackendError::Server {
            status: 429,
            message: Some("quota exceeded".to_string()),
        }));
        let chat = ChatController::new(backend);

        assert_eq!(chat.submit("hello").await, SubmitOutcome::ServerError);
        let transcript = chat.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[1], ChatMessage::assistant("quota exceeded"));

        let button = chat.submit_button();
        assert!(button.is_enabled());
        assert_eq!(button.enable_count(), 1);
        assert!(!chat.is_in_flight());
    }

    #[tokio::test]
    async fn test_server_error_without_text_uses_fallback() {
        let backend = MockBackend::replying(Err(BackendError::Server {
            status: 500,
            message: None,
        }));
        let chat = ChatController::new(backend);

        assert_eq!(chat.submit("hello").await, SubmitOutcome::ServerError);
        assert_eq!(
            chat.transcript().messages()[1].content,
            "Failed to get a response from the assistant"
        );
        assert_eq!(chat.submit_button().enable_count(), 1);
        assert!(!chat.is_in_flight());
    }

    #[tokio::test]
    async fn test_transport_error_is_reported_inline() {
        let backend = MockBackend::replying(Err(BackendError::Transport(
            "connection refused".to_string(),
        )));
        let chat = ChatController::new(backend);

        assert_eq!(chat.submit("hello").await, SubmitOutcome::TransportError);
        let last = chat.transcript().messages()[1].clone();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "Error: connection refused");
        assert_eq!(chat.submit_button().enable_count(), 1);
    }

    #[tokio::test]
    async fn test_button_disabled_exactly_while_in_flight() {
        let (tx, rx) = oneshot::channel();
        let backend = Arc::new(HeldBackend {
            started: Notify::new(),
            release: Mutex::new(Some(rx)),
        });
        let chat = Arc::new(ChatController::new(backend.clone()));

        let task = tokio::spawn({
            let chat = Arc::clone(&chat);
            async move { chat.submit("book lunch").await }
        });
        backend.started.notified().await;

        // User turn is visible before the reply arrives
        assert_eq!(chat.transcript().messages(), &[ChatMessage::user("book lunch")]);
        assert!(!chat.submit_button().is_enabled());
        assert!(chat.is_in_flight());

        // A programmatic second submit is rejected without touching the transcript
        assert_eq!(chat.submit("again").await, SubmitOutcome::Busy);
        assert_eq!(chat.transcript().len(), 1);

        tx.send(Err(BackendError::Transport("timed out".to_string()))).unwrap();
        assert_eq!(task.await.unwrap(), SubmitOutcome::TransportError);

        let button = chat.submit_button();
        assert!(button.is_enabled());
        assert_eq!(button.enable_count(), 1);
        assert!(!chat.is_in_flight());
        assert_eq!(chat.transcript().count_role(Role::Assistant), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_pending_turn() {
        let (tx, rx) = oneshot::channel();
        let backend = Arc::new(HeldBackend {
            started: Notify::new(),
            release: Mutex::new(Some(rx)),
        });
        let chat = Arc::new(ChatController::new(backend.clone()));
        let mut updates = chat.subscribe();

        let task = tokio::spawn({
            let chat = Arc::clone(&chat);
            async move { chat.submit("lunch friday").await }
        });
        backend.started.notified().await;

        // Notified before the reply: user turn shown, button disabled
        assert!(updates.has_changed().unwrap());
        updates.borrow_and_update();
        let page = render_page(&chat.transcript(), &chat.submit_button(), &chat.draft(), &PanelState::Loading)
            .unwrap();
        assert!(page.contains("lunch friday"));
        assert!(page.contains(" disabled>Sending...</button>"));
        assert!(!page.contains("message assistant"));

        tx.send(Ok(AssistantReply::new("Booked."))).unwrap();
        assert_eq!(task.await.unwrap(), SubmitOutcome::Replied);

        assert!(updates.has_changed().unwrap());
        let page = render_page(&chat.transcript(), &chat.submit_button(), &chat.draft(), &PanelState::Loading)
            .unwrap();
        assert!(page.contains("Booked."));
        assert!(page.contains("id=\"send-button\">Send</button>"));
    }

    #[tokio::test]
    async fn test_cancelled_submit_still_restores_button() {
        let (_tx, rx) = oneshot::channel();
        let backend = Arc::new(HeldBackend {
            started: Notify::new(),
            release: Mutex::new(Some(rx)),
        });
        let chat = Arc::new(ChatController::new(backend.clone()));

        let task = tokio::spawn({
            let chat = Arc::clone(&chat);
            async move { chat.submit("never answered").await }
        });
        backend.started.notified().await;
        task.abort();
        let _ = task.await;

        assert!(chat.submit_button().is_enabled());
        assert!(!chat.is_in_flight());
    }

    #[tokio::test]
    async fn test_reply_triggers_deferred_events_refresh() {
        let backend = MockBackend::replying(Ok(AssistantReply::new("Added it.")));
        let events = EventsPanelHandle::new(backend.clone(), EventDisplay::default());
        let chat = ChatController::new(backend.clone())
            .with_events_panel(events.clone(), Duration::from_millis(20));

        chat.submit("add standup").await;
        // Reply is in before the refresh runs
        assert_eq!(chat.transcript().len(), 2);
        assert_eq!(backend.event_fetches.load(Ordering::SeqCst), 0);

        let mut updates = events.subscribe();
        while events.state().is_loading() {
            tokio::time::timeout(Duration::from_secs(2), updates.changed())
                .await
                .expect("events refresh did not run")
                .unwrap();
        }
        assert_eq!(backend.event_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(events.state().rows()[0].title, "Standup");
    }

    #[tokio::test]
    async fn test_failed_turn_does_not_refresh_events() {
        let backend = MockBackend::replying(Err(BackendError::Server {
            status: 500,
            message: None,
        }));
        let events = EventsPanelHandle::new(backend.clone(), EventDisplay::default());
        let chat = ChatController::new(backend.clone()).with_events_panel(events, Duration::ZERO);

        chat.submit("add standup").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.event_fetches.load(Ordering::SeqCst), 0);
    }
}
