use crate::error::{config_error, ChatResult};
use chrono::{DateTime, FixedOffset, Locale, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::debug;

/// A parsed event start value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStart {
    /// Date-time with an explicit offset
    At(DateTime<FixedOffset>),
    /// Date-time without an offset, read as local to the display timezone
    Floating(NaiveDateTime),
    /// All-day event
    AllDay(NaiveDate),
}

/// Parse an event start value, or `None` if it is not a recognisable date
pub fn parse_event_start(raw: &str) -> Option<EventStart> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(EventStart::At(dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(EventStart::Floating(dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(EventStart::Floating(dt));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(EventStart::AllDay)
}

/// Map a UI locale such as `fi` or `en-GB` onto a chrono formatting locale
pub fn chrono_locale(locale: &str) -> Locale {
    let language = locale
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    match language.as_str() {
        "fi" => Locale::fi_FI,
        "sv" => Locale::sv_SE,
        "de" => Locale::de_DE,
        _ => Locale::en_US,
    }
}

/// How event times are shown in the panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventDisplay {
    timezone: Tz,
    locale: Locale,
}

impl Default for EventDisplay {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            locale: Locale::en_US,
        }
    }
}

impl EventDisplay {
    pub fn new(timezone: &str, locale: &str) -> ChatResult<Self> {
        let timezone = timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", timezone)))?;

        Ok(Self {
            timezone,
            locale: chrono_locale(locale),
        })
    }

    fn is_twelve_hour(&self) -> bool {
        self.locale == Locale::en_US
    }

    fn datetime_pattern(&self) -> &'static str {
        if self.is_twelve_hour() {
            "%b %-d, %I:%M %p"
        } else {
            "%-d. %b %H:%M"
        }
    }

    fn date_pattern(&self) -> &'static str {
        if self.is_twelve_hour() {
            "%b %-d"
        } else {
            "%-d. %b"
        }
    }

    fn format_local(&self, dt: &DateTime<Tz>, pattern: &str) -> String {
        dt.format_localized(pattern, self.locale).to_string()
    }

    /// Short form of an event start: abbreviated month, day and time.
    /// Values that do not parse are returned verbatim.
    pub fn format_start(&self, raw: &str) -> String {
        match parse_event_start(raw) {
            Some(EventStart::At(dt)) => {
                self.format_local(&dt.with_timezone(&self.timezone), self.datetime_pattern())
            }
            Some(EventStart::Floating(naive)) => {
                match self.timezone.from_local_datetime(&naive).earliest() {
                    Some(dt) => self.format_local(&dt, self.datetime_pattern()),
                    None => raw.to_string(),
                }
            }
            Some(EventStart::AllDay(date)) => {
                let midnight = date
                    .and_hms_opt(0, 0, 0)
                    .and_then(|naive| self.timezone.from_local_datetime(&naive).earliest());
                match midnight {
                    Some(dt) => self.format_local(&dt, self.date_pattern()),
                    None => raw.to_string(),
                }
            }
            None => {
                debug!("Could not parse event start {:?}, showing it as is", raw);
                raw.to_string()
            }
        }
    }
}
