use crate::error::ChatResult;
use askama::Template;
use rust_i18n::t;

/// One rendered row of the events panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub time: String,
    pub title: String,
}

/// Single-line placeholder in the panel: loading, empty or error text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub class: &'static str,
    pub text: String,
}

impl Notice {
    fn new(class: &'static str, text: impl Into<String>) -> Self {
        Self {
            class,
            text: text.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "partials/events.html", escape = "html")]
struct EventsTemplate<'a> {
    events: &'a PanelState,
}

/// What the panel currently shows. Each refresh replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Loading,
    Empty,
    Populated(Vec<EventRow>),
    Errored(String),
}

impl PanelState {
    pub fn rows(&self) -> &[EventRow] {
        match self {
            PanelState::Populated(rows) => rows,
            _ => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    /// Placeholder shown instead of rows, if any
    pub fn notice(&self) -> Option<Notice> {
        match self {
            PanelState::Loading => Some(Notice::new("loading", t!("events_loading"))),
            PanelState::Empty => Some(Notice::new("no-events", t!("events_empty"))),
            PanelState::Errored(message) => Some(Notice::new("error", message.as_str())),
            PanelState::Populated(_) => None,
        }
    }

    /// Render the panel's list container
    pub fn render_html(&self) -> ChatResult<String> {
        Ok(EventsTemplate { events: self }.render()?)
    }

    /// Render for a terminal
    pub fn render_plain(&self) -> String {
        let mut out = format!("== {} ==", t!("events_heading"));
        match self.notice() {
            Some(notice) => {
                out.push('\n');
                out.push_str(&notice.text);
            }
            None => {
                for row in self.rows() {
                    out.push_str(&format!("\n  {}  {}", row.time, row.title));
                }
            }
        }
        out
    }
}
