use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    #[diagnostic(code(kalenterichat::http_client))]
    HttpClient(#[from] reqwest::Error),

    #[error("Environment error: {0}")]
    #[diagnostic(code(kalenterichat::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(kalenterichat::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(kalenterichat::io))]
    Io(#[from] std::io::Error),

    #[error("Template error: {0}")]
    #[diagnostic(code(kalenterichat::template))]
    Template(#[from] askama::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(kalenterichat::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(kalenterichat::other))]
    Other(String),
}

/// Outcome of a failed call to the assistant backend.
///
/// Never raised as an application [`Error`]: the chat and events components
/// turn every variant into something shown to the user.
///
/// `Server` is an application error: the backend answered, but with a non-2xx
/// status (or a 2xx without the expected payload). `Transport` covers every
/// case where no usable response arrived at all, including unreadable bodies.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum BackendError {
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no error message"))]
    #[diagnostic(code(kalenterichat::backend::server))]
    Server { status: u16, message: Option<String> },

    #[error("{0}")]
    #[diagnostic(code(kalenterichat::backend::transport))]
    Transport(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

/// Type alias for Result with our Error type
pub type ChatResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid value for environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}
