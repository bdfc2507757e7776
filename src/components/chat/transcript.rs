use crate::error::ChatResult;
use crate::utils::html::{format_message, format_plain};
use askama::Template;
use chrono::{DateTime, Utc};
use rust_i18n::t;

/// Who a transcript entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// CSS class used for the message node
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Localized speaker name for plain-text output
    pub fn display_name(&self) -> String {
        match self {
            Role::User => t!("role_user").to_string(),
            Role::Assistant => t!("role_assistant").to_string(),
        }
    }
}

/// One transcript entry. Content is kept raw and escaped when rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Escaped reply with line breaks and bullets. Only used for assistant
    /// turns; user text is left to the template's escaping.
    pub fn formatted_html(&self) -> String {
        format_message(&self.content)
    }

    /// Render the message node
    pub fn render_html(&self) -> ChatResult<String> {
        Ok(MessageTemplate { message: self }.render()?)
    }

    /// Render for a terminal, e.g. `Assistant> • Standup`
    pub fn render_plain(&self) -> String {
        let body = match self.role {
            Role::User => self.content.clone(),
            Role::Assistant => format_plain(&self.content),
        };
        format!("{}> {}", self.role.display_name(), body)
    }
}

#[derive(Template)]
#[template(path = "partials/message.html", escape = "html")]
struct MessageTemplate<'a> {
    message: &'a ChatMessage,
}

#[derive(Template)]
#[template(path = "partials/transcript.html", escape = "html")]
struct TranscriptTemplate<'a> {
    messages: &'a [ChatMessage],
}

/// The chat history of one session. Purely presentational; nothing is stored.
///
/// There is no scroll position to track: the view always follows the newest
/// message, and the rendered page scrolls the container to the bottom.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message; returns its index
    pub fn append(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages appended at or after `index`
    pub fn since(&self, index: usize) -> &[ChatMessage] {
        self.messages.get(index..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    /// Render the whole transcript container
    pub fn render_html(&self) -> ChatResult<String> {
        Ok(TranscriptTemplate {
            messages: &self.messages,
        }
        .render()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_markup_renders_literally() {
        let html = ChatMessage::user("<b>hi</b>").render_html().unwrap();
        assert!(html.starts_with("<div class=\"message user\"><div class=\"message-content\">&lt;b&gt;hi"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_user_text_is_not_reformatted() {
        let html = ChatMessage::user("- not a bullet\nsecond").render_html().unwrap();
        assert!(html.contains("- not a bullet\nsecond"));
        assert!(!html.contains("<br>"));
        assert!(!html.contains('•'));
    }

    #[test]
    fn test_assistant_reply_is_formatted() {
        let message = ChatMessage::assistant("line1\n- item <script>");
        assert_eq!(message.formatted_html(), "line1<br>• item &lt;script&gt;");

        let html = message.render_html().unwrap();
        assert!(html.contains("message assistant"));
        assert!(html.contains("<div class=\"message-content\">line1<br>• item &lt;script&gt;</div>"));
        assert!(!html.contains("&lt;br&gt;"));
    }

    #[test]
    fn test_reply_timestamp_is_kept_as_attribute() {
        use chrono::TimeZone;
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let html = ChatMessage::assistant("ok").with_timestamp(Some(ts)).render_html().unwrap();
        assert!(html.starts_with("<div class=\"message assistant\" data-timestamp=\"2024-01-01T10:00:00+00:00\">"));

        let html = ChatMessage::assistant("ok").render_html().unwrap();
        assert!(!html.contains("data-timestamp"));
    }

    #[test]
    fn test_append_keeps_order() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());

        assert_eq!(transcript.append(ChatMessage::user("hello")), 0);
        assert_eq!(transcript.append(ChatMessage::assistant("hi")), 1);

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.count_role(Role::User), 1);
        assert_eq!(transcript.since(1), &[ChatMessage::assistant("hi")]);
        assert!(transcript.since(5).is_empty());

        let html = transcript.render_html().unwrap();
        assert!(html.starts_with("<div id=\"chat-messages\" class=\"chat-messages\">"));
        let user = html.find("message user").unwrap();
        let assistant = html.find("message assistant").unwrap();
        assert!(user < assistant);
    }

    #[test]
    fn test_render_plain() {
        assert_eq!(ChatMessage::user("hello").render_plain(), "You> hello");
        assert_eq!(
            ChatMessage::assistant("Today:\n- Standup").render_plain(),
            "Assistant> Today:\n• Standup"
        );
    }
}
