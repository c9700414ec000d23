use super::identity::IdentityPolicy;
use super::models::{SourceChange, SourceEvent};
use super::transcode::EventTranscoder;
use crate::calendar::CalendarApi;
use crate::error::BotResult;
use std::sync::Arc;
use tracing::{debug, info};

/// Applies a single scheduled-event lifecycle change to the calendar.
///
/// The calendar client and transcoder are injected at construction so
/// tests can substitute a mock calendar. Every operation is idempotent
/// under redelivery; the gateway does not promise at-most-once.
pub struct ChangeHandler<C: CalendarApi> {
    calendar: Arc<C>,
    transcoder: EventTranscoder,
}

impl<C: CalendarApi> ChangeHandler<C> {
    pub fn new(calendar: Arc<C>, transcoder: EventTranscoder) -> Self {
        Self {
            calendar,
            transcoder,
        }
    }

    /// The transcoder this handler writes calendar events through
    pub fn transcoder(&self) -> &EventTranscoder {
        &self.transcoder
    }

    /// Single entry point for live lifecycle notifications
    pub async fn apply(&self, change: SourceChange) -> BotResult<()> {
        match change {
            SourceChange::Created(event) => self.on_create(&event).await,
            SourceChange::Updated { old, new } => self.on_update(&old, &new).await,
            SourceChange::Deleted(event) => self.on_delete(&event).await,
        }
    }

    /// Create the calendar event for a new scheduled event. If an event
    /// with that id already exists the create is converted into an
    /// update, so redelivered create notifications converge instead of
    /// failing.
    pub async fn on_create(&self, event: &SourceEvent) -> BotResult<()> {
        let target = self.transcoder.transcode(event)?;
        match self.calendar.insert(&target).await {
            Ok(_) => {
                info!("Google Calendar event created for {}", event.name);
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                debug!("calendar event {} already exists, updating instead", target.id);
                self.on_update(event, event).await
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the calendar event for an updated scheduled event. The
    /// calendar is addressed by the old event's id; Discord keeps event
    /// ids stable across updates, so old and new normally agree. A
    /// missing calendar event surfaces as NotFound rather than being
    /// recreated, since it means a create was missed or the calendar
    /// was edited externally.
    pub async fn on_update(&self, old: &SourceEvent, new: &SourceEvent) -> BotResult<()> {
        let event_id = IdentityPolicy::target_event_id(old);
        let mut target = self.transcoder.transcode(new)?;
        target.id = event_id.clone();
        self.calendar.update(&event_id, &target).await?;
        info!("Google Calendar event updated for {}", new.name);
        Ok(())
    }

    /// Delete the calendar event for a removed scheduled event. A
    /// calendar event that is already gone counts as success.
    pub async fn on_delete(&self, event: &SourceEvent) -> BotResult<()> {
        let event_id = IdentityPolicy::target_event_id(event);
        match self.calendar.delete(&event_id).await {
            Ok(()) => {
                info!("Google Calendar event deleted for {}", event.name);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!("calendar event {} already deleted", event_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
