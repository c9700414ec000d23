mod client;
pub mod token;

pub use client::GoogleCalendarClient;

use crate::error::BotResult;
use crate::sync::models::TargetEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Calendar operations the sync core needs. The Google client
/// implements this for production; tests substitute an in-memory
/// calendar.
#[async_trait]
pub trait CalendarApi: Send + Sync + 'static {
    /// List upcoming events, single instances, ordered by start time
    async fn list_upcoming(
        &self,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> BotResult<Vec<TargetEvent>>;

    /// Insert an event under its caller-supplied id. Fails with
    /// `Error::Conflict` if that id already exists.
    async fn insert(&self, event: &TargetEvent) -> BotResult<TargetEvent>;

    /// Replace all fields of the event with the given id. Fails with
    /// `Error::NotFound` if there is no such event.
    async fn update(&self, event_id: &str, event: &TargetEvent) -> BotResult<TargetEvent>;

    /// Delete the event with the given id. Fails with
    /// `Error::NotFound` if there is no such event.
    async fn delete(&self, event_id: &str) -> BotResult<()>;
}
