use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Where a scheduled event takes place. Discord voice events carry a
/// channel, everything else carries a free-text place. A voice event
/// without a resolvable channel is rejected at the gateway boundary, so
/// this type never holds a half-formed location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    VoiceChannel(String),
    External(String),
}

/// A Discord guild scheduled event, as observed from the gateway.
/// Owned and mutated by Discord; treated here as an immutable value
/// per notification.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub location: SourceLocation,
}

/// A single scheduled-event lifecycle notification. All live changes
/// flow through this one message type so the dispatch loop handles
/// exactly one change at a time.
#[derive(Debug, Clone)]
pub enum SourceChange {
    Created(SourceEvent),
    Updated { old: SourceEvent, new: SourceEvent },
    Deleted(SourceEvent),
}

impl SourceChange {
    /// Name of the affected event, for log lines
    pub fn event_name(&self) -> &str {
        match self {
            SourceChange::Created(event) | SourceChange::Deleted(event) => &event.name,
            SourceChange::Updated { new, .. } => &new.name,
        }
    }
}

/// An instant in the Google Calendar wire shape: RFC 3339 dateTime plus
/// an explicit time zone tag. Discord delivers instants normalized to
/// UTC, so the tag is always UTC here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl EventDateTime {
    /// Tag an instant as UTC
    pub fn utc(instant: DateTime<Utc>) -> Self {
        Self {
            date_time: instant.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_zone: "UTC".to_string(),
        }
    }
}

/// A Google Calendar event, in the calendar v3 wire shape. The id is
/// always the stringified Discord event id, which is what lets updates
/// and deletes address the calendar directly with no mapping table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetEvent {
    pub id: String,
    pub summary: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
}
