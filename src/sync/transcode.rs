use super::models::{EventDateTime, SourceEvent, SourceLocation, TargetEvent};
use crate::error::{transcode_error, BotResult};

/// Prefix for calendar locations that are Discord voice channels
pub const CHANNEL_NAME_PREFIX: &str = "🔉 ";

/// Prefix for calendar locations that are free-text places
pub const LOCATION_PREFIX: &str = "📍 ";

/// Pure mapping from a Discord scheduled event to its Google Calendar
/// representation. No I/O and no state beyond the summary prefix, which
/// is derived once from the guild name at connect time.
#[derive(Debug, Clone)]
pub struct EventTranscoder {
    summary_prefix: String,
}

impl EventTranscoder {
    /// Build a transcoder for the given guild display name
    pub fn new(guild_name: &str) -> Self {
        Self {
            summary_prefix: format!("Discord ({}): ", guild_name),
        }
    }

    /// The summary a given event name transcodes to
    pub fn summary_for(&self, event_name: &str) -> String {
        format!("{}{}", self.summary_prefix, event_name)
    }

    /// Map a source event to the calendar event it should appear as.
    ///
    /// Voice events have no declared end time in the Discord model, so
    /// they become zero-duration markers: end is set equal to start.
    /// This is a named policy, not an oversight; revisit here if voice
    /// events should ever get a default duration instead.
    pub fn transcode(&self, event: &SourceEvent) -> BotResult<TargetEvent> {
        let (location, end) = match &event.location {
            SourceLocation::VoiceChannel(channel) => {
                (format!("{}{}", CHANNEL_NAME_PREFIX, channel), event.start)
            }
            SourceLocation::External(place) => {
                let end = event.end.ok_or_else(|| {
                    transcode_error(&format!("external event '{}' has no end time", event.name))
                })?;
                (format!("{}{}", LOCATION_PREFIX, place), end)
            }
        };

        Ok(TargetEvent {
            id: event.id.to_string(),
            summary: self.summary_for(&event.name),
            location,
            description: event.description.clone(),
            start: EventDateTime::utc(event.start),
            end: EventDateTime::utc(end),
        })
    }
}
