mod composer;
mod controller;
mod transcript;

pub use composer::{ButtonLabel, Composer, SubmitButton};
pub use controller::{ChatController, SubmitOutcome};
pub use transcript::{ChatMessage, Role, Transcript};
