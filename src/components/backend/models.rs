use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `POST /api/message`
#[derive(Debug, Clone, Serialize)]
pub struct MessageRequest<'a> {
    pub message: &'a str,
}

/// Success body of `POST /api/message`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Error body shared by both endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Success body of `GET /api/events`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventsResponse {
    #[serde(default)]
    pub events: Option<Vec<CalendarEventSummary>>,
}

/// One upcoming event as delivered by the backend.
///
/// `start` is either an RFC 3339 date-time or, for all-day events, a plain
/// `YYYY-MM-DD` date. The backend sends `null` when an event has neither.
/// Text fields never fail the whole list: `null` becomes `None` and any other
/// non-string value is kept as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalendarEventSummary {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

impl CalendarEventSummary {
    pub fn new(start: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            summary: Some(summary.into()),
            ..Default::default()
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

/// A successful assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantReply {
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl AssistantReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: None,
        }
    }
}

/// Parse the reply timestamp; the backend sends naive UTC ISO strings
pub fn parse_reply_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
