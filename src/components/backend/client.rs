use super::models::{
    parse_reply_timestamp, AssistantReply, CalendarEventSummary, ErrorBody, EventsResponse,
    MessageRequest, MessageResponse,
};
use super::Backend;
use crate::config::Config;
use crate::error::{config_error, BackendError, ChatResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const MESSAGE_PATH: &str = "api/message";
const EVENTS_PATH: &str = "api/events";

/// `Backend` implementation talking JSON over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    message_url: Url,
    events_url: Url,
}

impl HttpBackend {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: &str, timeout: Duration, session_cookie: Option<&str>) -> ChatResult<Self> {
        // Url::join replaces the last path segment unless the base ends in '/'
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;

        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| config_error(&format!("Invalid session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            message_url: base.join(MESSAGE_PATH)?,
            events_url: base.join(EVENTS_PATH)?,
        })
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &Config) -> ChatResult<Self> {
        Self::new(
            &config.backend_url,
            Duration::from_secs(config.request_timeout),
            config.session_cookie.as_deref(),
        )
    }

    pub fn message_url(&self) -> &Url {
        &self.message_url
    }

    pub fn events_url(&self) -> &Url {
        &self.events_url
    }
}

/// Turn a non-2xx response into a server error, keeping the backend's message if it sent one
async fn server_error(response: Response) -> BackendError {
    let status = response.status().as_u16();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error)
        .filter(|message| !message.trim().is_empty());

    warn!("Backend responded with HTTP {}: {:?}", status, message);
    BackendError::Server { status, message }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    warn!("Backend request failed: {}", err);
    BackendError::Transport(err.to_string())
}

#[async_trait]
impl Backend for HttpBackend {
    async fn send_message(&self, message: &str) -> Result<AssistantReply, BackendError> {
        debug!("Posting message to {}", self.message_url);

        let response = self
            .client
            .post(self.message_url.clone())
            .json(&MessageRequest { message })
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let status = response.status().as_u16();
        let body: MessageResponse = response.json().await.map_err(transport_error)?;

        match body.response {
            Some(text) => Ok(AssistantReply {
                text,
                timestamp: body.timestamp.as_deref().and_then(parse_reply_timestamp),
            }),
            None => {
                warn!("Backend reply had no response field");
                Err(BackendError::Server {
                    status,
                    message: None,
                })
            }
        }
    }

    async fn list_events(&self) -> Result<Vec<CalendarEventSummary>, BackendError> {
        debug!("Fetching events from {}", self.events_url);

        let response = self
            .client
            .get(self.events_url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let body: EventsResponse = response.json().await.map_err(transport_error)?;
        Ok(body.events.unwrap_or_default())
    }
}
