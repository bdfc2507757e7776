pub mod html;

pub use html::{escape_html, format_message, format_plain};
