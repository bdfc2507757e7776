//! Full-page render of a chat session: transcript, composer and events sidebar.

use super::chat::{ChatMessage, SubmitButton, Transcript};
use super::events_panel::PanelState;
use crate::error::ChatResult;
use askama::Template;
use rust_i18n::t;

#[derive(Template)]
#[template(path = "page.html", escape = "html")]
struct PageTemplate<'a> {
    lang: String,
    title: String,
    heading: String,
    messages: &'a [ChatMessage],
    button: &'a SubmitButton,
    draft: &'a str,
    events: &'a PanelState,
}

/// Render a complete HTML document for the current session state
pub fn render_page(
    transcript: &Transcript,
    button: &SubmitButton,
    draft: &str,
    events: &PanelState,
) -> ChatResult<String> {
    let template = PageTemplate {
        lang: (*rust_i18n::locale()).to_string(),
        title: t!("page_title").to_string(),
        heading: t!("events_heading").to_string(),
        messages: transcript.messages(),
        button,
        draft,
        events,
    };
    Ok(template.render()?)
}
