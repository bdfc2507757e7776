use crate::error::ChatResult;
use askama::Template;
use rust_i18n::t;

/// Label shown on the submit affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonLabel {
    #[default]
    Send,
    Sending,
}

impl ButtonLabel {
    pub fn text(&self) -> String {
        match self {
            ButtonLabel::Send => t!("button_send").to_string(),
            ButtonLabel::Sending => t!("button_sending").to_string(),
        }
    }
}

/// Presentation state of the submit affordance.
///
/// This is what the user sees. Whether a request is actually running is
/// tracked separately by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitButton {
    enabled: bool,
    label: ButtonLabel,
    enable_count: usize,
}

impl Default for SubmitButton {
    fn default() -> Self {
        Self {
            enabled: true,
            label: ButtonLabel::Send,
            enable_count: 0,
        }
    }
}

impl SubmitButton {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn label(&self) -> ButtonLabel {
        self.label
    }

    /// How many times the button has been re-enabled after a send
    pub fn enable_count(&self) -> usize {
        self.enable_count
    }

    pub(crate) fn begin_sending(&mut self) {
        self.enabled = false;
        self.label = ButtonLabel::Sending;
    }

    pub(crate) fn finish_sending(&mut self) {
        self.enabled = true;
        self.label = ButtonLabel::Send;
        self.enable_count += 1;
    }

    pub fn render_html(&self) -> ChatResult<String> {
        Ok(ButtonTemplate { button: self }.render()?)
    }
}

#[derive(Template)]
#[template(path = "partials/button.html", escape = "html")]
struct ButtonTemplate<'a> {
    button: &'a SubmitButton,
}

/// The input field and its submit affordance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub draft: String,
    pub button: SubmitButton,
}
