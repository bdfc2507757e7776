pub mod backend;
pub mod chat;
pub mod events_panel;
pub mod page;

pub use backend::{Backend, HttpBackend};
pub use chat::ChatController;
pub use events_panel::{EventsPanelHandle, RefreshOutcome};
