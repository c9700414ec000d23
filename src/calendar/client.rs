use super::token::TokenManager;
use super::CalendarApi;
use crate::config::Config;
use crate::error::{calendar_error, BotResult, Error};
use crate::sync::models::{EventDateTime, TargetEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use url::Url;

const API_BASE: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Google Calendar v3 client over the configured calendar
pub struct GoogleCalendarClient {
    config: Arc<RwLock<Config>>,
    token_manager: TokenManager,
    client: Client,
}

impl GoogleCalendarClient {
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            config: Arc::clone(&config),
            token_manager: TokenManager::new(config),
            client: Client::new(),
        }
    }

    async fn calendar_id(&self) -> String {
        let config_read = self.config.read().await;
        config_read.google_calendar_id.clone()
    }

    async fn auth_header(&self) -> BotResult<String> {
        let token = self.token_manager.get_access_token().await?;
        Ok(format!("Bearer {}", token))
    }

    /// Map a non-success calendar response to our error taxonomy
    async fn response_error(response: reqwest::Response, event_id: &str) -> Error {
        let status = response.status();
        match status {
            StatusCode::CONFLICT => Error::Conflict {
                event_id: event_id.to_string(),
            },
            // Deleting an already-deleted event yields 410 Gone
            StatusCode::NOT_FOUND | StatusCode::GONE => Error::NotFound {
                event_id: event_id.to_string(),
            },
            _ => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Could not read error response".to_string());
                calendar_error(&format!("HTTP {} - {}", status, error_body))
            }
        }
    }
}

/// Pull one event out of a calendar API response. Lenient on purpose:
/// hand-created calendar entries may lack a summary or use all-day
/// dates, and those still need to appear in the reconciliation window.
fn parse_event(value: &Value) -> TargetEvent {
    let id = value
        .get("id")
        .and_then(|id| id.as_str())
        .unwrap_or("")
        .to_string();
    let summary = value
        .get("summary")
        .and_then(|s| s.as_str())
        .unwrap_or("")
        .to_string();
    let location = value
        .get("location")
        .and_then(|s| s.as_str())
        .unwrap_or("")
        .to_string();
    let description = value
        .get("description")
        .and_then(|s| s.as_str())
        .map(|s| s.to_string());

    let parse_instant = |key: &str| -> EventDateTime {
        let field = value.get(key).and_then(|v| v.as_object());
        EventDateTime {
            date_time: field
                .and_then(|f| f.get("dateTime"))
                .and_then(|dt| dt.as_str())
                .unwrap_or("")
                .to_string(),
            time_zone: field
                .and_then(|f| f.get("timeZone"))
                .and_then(|tz| tz.as_str())
                .unwrap_or("")
                .to_string(),
        }
    };

    TargetEvent {
        id,
        summary,
        location,
        description,
        start: parse_instant("start"),
        end: parse_instant("end"),
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_upcoming(
        &self,
        time_min: DateTime<Utc>,
        max_results: u32,
    ) -> BotResult<Vec<TargetEvent>> {
        let calendar_id = self.calendar_id().await;
        let url_str = format!("{}/{}/events", API_BASE, calendar_id);

        let mut url = Url::parse(&url_str)
            .map_err(|e| calendar_error(&format!("Failed to parse URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("timeMin", &time_min.to_rfc3339())
            .append_pair("maxResults", &max_results.to_string())
            .append_pair("singleEvents", "true")
            .append_pair("orderBy", "startTime");

        let response = self
            .client
            .get(url)
            .header("Authorization", self.auth_header().await?)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to fetch events: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response, "").await);
        }

        let response_data: Value = response
            .json()
            .await
            .map_err(|e| calendar_error(&format!("Failed to parse events response: {}", e)))?;

        let events = response_data
            .get("items")
            .and_then(|i| i.as_array())
            .map(|items| items.iter().map(parse_event).collect())
            .unwrap_or_default();

        Ok(events)
    }

    async fn insert(&self, event: &TargetEvent) -> BotResult<TargetEvent> {
        let calendar_id = self.calendar_id().await;
        let url = format!("{}/{}/events", API_BASE, calendar_id);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header().await?)
            .json(event)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to insert event: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response, &event.id).await);
        }

        let created: Value = response
            .json()
            .await
            .map_err(|e| calendar_error(&format!("Failed to parse insert response: {}", e)))?;

        Ok(parse_event(&created))
    }

    async fn update(&self, event_id: &str, event: &TargetEvent) -> BotResult<TargetEvent> {
        let calendar_id = self.calendar_id().await;
        let url = format!("{}/{}/events/{}", API_BASE, calendar_id, event_id);

        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header().await?)
            .json(event)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to update event: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response, event_id).await);
        }

        let updated: Value = response
            .json()
            .await
            .map_err(|e| calendar_error(&format!("Failed to parse update response: {}", e)))?;

        Ok(parse_event(&updated))
    }

    async fn delete(&self, event_id: &str) -> BotResult<()> {
        let calendar_id = self.calendar_id().await;
        let url = format!("{}/{}/events/{}", API_BASE, calendar_id, event_id);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header().await?)
            .send()
            .await
            .map_err(|e| calendar_error(&format!("Failed to delete event: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::response_error(response, event_id).await);
        }

        Ok(())
    }
}
