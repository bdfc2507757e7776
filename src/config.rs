use crate::error::{config_error, env_error, ChatResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Default backend address, matching the assistant's development server
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Optional configuration file, read relative to the working directory
pub const CONFIG_FILE: &str = "config/chat.toml";

/// Main configuration structure for the chat client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the assistant backend
    pub backend_url: String,
    /// Cookie header value forwarded with every backend request
    pub session_cookie: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Delay before the events panel is refreshed after a chat reply
    pub refresh_delay_ms: u64,
    /// Periodic events refresh in seconds, 0 disables polling
    pub events_poll_interval: u64,
    /// Locale for UI strings and date formatting
    pub locale: String,
    /// Timezone events are displayed in
    pub timezone: String,
    /// Where the rendered page is written after every change
    pub export_html: Option<PathBuf>,
}

/// Values accepted from `config/chat.toml`; anything missing keeps its default
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub session_cookie: Option<String>,
    pub request_timeout: Option<u64>,
    pub refresh_delay_ms: Option<u64>,
    pub events_poll_interval: Option<u64>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub export_html: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            session_cookie: None,
            request_timeout: 30,
            refresh_delay_ms: 1000,
            events_poll_interval: 0,
            locale: "en".to_string(),
            timezone: "UTC".to_string(),
            export_html: None,
        }
    }
}

impl Config {
    /// Load configuration from defaults, the config file and the environment
    pub fn load() -> ChatResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let file = Self::read_file(Path::new(CONFIG_FILE))?;
        Self::from_sources(file, |key| env::var(key).ok())
    }

    /// Read the optional TOML config file
    pub fn read_file(path: &Path) -> ChatResult<Option<FileConfig>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(toml::from_str::<FileConfig>(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Merge defaults, file values and environment lookups (in that order of precedence)
    pub fn from_sources<F>(file: Option<FileConfig>, lookup: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(file) = file {
            if let Some(url) = file.backend_url {
                config.backend_url = url;
            }
            config.session_cookie = file.session_cookie.or(config.session_cookie);
            if let Some(timeout) = file.request_timeout {
                config.request_timeout = timeout;
            }
            if let Some(delay) = file.refresh_delay_ms {
                config.refresh_delay_ms = delay;
            }
            if let Some(interval) = file.events_poll_interval {
                config.events_poll_interval = interval;
            }
            if let Some(locale) = file.locale {
                config.locale = locale;
            }
            if let Some(timezone) = file.timezone {
                config.timezone = timezone;
            }
            config.export_html = file.export_html.or(config.export_html);
        }

        if let Some(url) = lookup("CHAT_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(cookie) = lookup("CHAT_SESSION_COOKIE") {
            config.session_cookie = Some(cookie);
        }
        if let Some(timeout) = lookup("CHAT_REQUEST_TIMEOUT") {
            config.request_timeout = timeout
                .parse::<u64>()
                .map_err(|_| env_error("CHAT_REQUEST_TIMEOUT"))?;
        }
        if let Some(delay) = lookup("CHAT_REFRESH_DELAY_MS") {
            config.refresh_delay_ms = delay
                .parse::<u64>()
                .map_err(|_| env_error("CHAT_REFRESH_DELAY_MS"))?;
        }
        if let Some(interval) = lookup("CHAT_EVENTS_POLL_SECS") {
            config.events_poll_interval = interval
                .parse::<u64>()
                .map_err(|_| env_error("CHAT_EVENTS_POLL_SECS"))?;
        }
        if let Some(locale) = lookup("CHAT_LOCALE") {
            config.locale = locale;
        }
        if let Some(timezone) = lookup("TIMEZONE") {
            config.timezone = timezone;
        }
        if let Some(path) = lookup("CHAT_EXPORT_HTML") {
            config.export_html = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise only fail once the session is running
    pub fn validate(&self) -> ChatResult<()> {
        Url::parse(&self.backend_url)?;

        if self.timezone.parse::<Tz>().is_err() {
            return Err(config_error(&format!("Unknown timezone: {}", self.timezone)));
        }

        if self.request_timeout == 0 {
            return Err(config_error("Request timeout must be at least one second"));
        }

        Ok(())
    }
}
