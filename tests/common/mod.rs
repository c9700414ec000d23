use async_trait::async_trait;
use calbridge::calendar::CalendarApi;
use calbridge::error::{BotResult, Error};
use calbridge::sync::models::{EventDateTime, TargetEvent};
use calbridge::sync::{SourceEvent, SourceLocation};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Mutex;

/// Counters for how often each calendar operation was invoked
#[derive(Debug, Default, Clone, Copy)]
pub struct CallCounts {
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
}

/// In-memory stand-in for the Google Calendar API. Behaves like the
/// real thing where the sync core cares: inserting a taken id is a
/// conflict, updating or deleting a missing id is not-found, and an
/// update keeps the id it was addressed with.
#[derive(Default)]
pub struct MockCalendar {
    events: Mutex<Vec<TargetEvent>>,
    calls: Mutex<CallCounts>,
}

impl MockCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock calendar seeded with pre-existing events
    pub fn with_events(events: Vec<TargetEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            calls: Mutex::new(CallCounts::default()),
        }
    }

    pub fn events(&self) -> Vec<TargetEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap()
    }

    pub fn find(&self, event_id: &str) -> Option<TargetEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
    }
}

#[async_trait]
impl CalendarApi for MockCalendar {
    async fn list_upcoming(
        &self,
        _time_min: DateTime<Utc>,
        max_results: u32,
    ) -> BotResult<Vec<TargetEvent>> {
        let events = self.events.lock().unwrap();
        Ok(events.iter().take(max_results as usize).cloned().collect())
    }

    async fn insert(&self, event: &TargetEvent) -> BotResult<TargetEvent> {
        self.calls.lock().unwrap().insert += 1;
        let mut events = self.events.lock().unwrap();
        if events.iter().any(|e| e.id == event.id) {
            return Err(Error::Conflict {
                event_id: event.id.clone(),
            });
        }
        events.push(event.clone());
        Ok(event.clone())
    }

    async fn update(&self, event_id: &str, event: &TargetEvent) -> BotResult<TargetEvent> {
        self.calls.lock().unwrap().update += 1;
        let mut events = self.events.lock().unwrap();
        let existing = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| Error::NotFound {
                event_id: event_id.to_string(),
            })?;
        // The path id addresses the resource; the stored id never changes
        let mut replacement = event.clone();
        replacement.id = event_id.to_string();
        *existing = replacement.clone();
        Ok(replacement)
    }

    async fn delete(&self, event_id: &str) -> BotResult<()> {
        self.calls.lock().unwrap().delete += 1;
        let mut events = self.events.lock().unwrap();
        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            return Err(Error::NotFound {
                event_id: event_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Build a calendar event the way an operator might have entered it by
/// hand, with a calendar-assigned id unrelated to any Discord event
pub fn manual_entry(id: &str, summary: &str) -> TargetEvent {
    TargetEvent {
        id: id.to_string(),
        summary: summary.to_string(),
        location: String::new(),
        description: None,
        start: EventDateTime {
            date_time: "2024-06-01T18:00:00Z".to_string(),
            time_zone: "UTC".to_string(),
        },
        end: EventDateTime {
            date_time: "2024-06-01T19:00:00Z".to_string(),
            time_zone: "UTC".to_string(),
        },
    }
}

/// A voice scheduled event starting June 1st 2024 at the given hour
pub fn voice_event(id: u64, name: &str, channel: &str, hour: u32) -> SourceEvent {
    SourceEvent {
        id,
        name: name.to_string(),
        description: Some(format!("{} in {}", name, channel)),
        start: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        end: None,
        location: SourceLocation::VoiceChannel(channel.to_string()),
    }
}

/// An external scheduled event with a one-hour duration
pub fn external_event(id: u64, name: &str, place: &str, hour: u32) -> SourceEvent {
    SourceEvent {
        id,
        name: name.to_string(),
        description: None,
        start: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
        end: Some(Utc.with_ymd_and_hms(2024, 6, 1, hour + 1, 0, 0).unwrap()),
        location: SourceLocation::External(place.to_string()),
    }
}
