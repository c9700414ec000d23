use super::handler::ChangeHandler;
use super::identity::IdentityPolicy;
use super::models::SourceEvent;
use crate::calendar::CalendarApi;
use crate::error::BotResult;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a reconciliation pass, for the startup log line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: usize,
    pub skipped: usize,
}

/// One-shot startup pass that backfills calendar events for scheduled
/// events created while the bot was offline. The gateway only delivers
/// live changes after connecting, so anything older exists solely in
/// the snapshot.
///
/// The pass is additive: calendar events with no surviving Discord
/// counterpart are left alone. Deletions are driven only by live
/// notifications.
pub struct ReconciliationEngine<C: CalendarApi> {
    calendar: Arc<C>,
    handler: Arc<ChangeHandler<C>>,
    max_results: u32,
}

impl<C: CalendarApi> ReconciliationEngine<C> {
    pub fn new(calendar: Arc<C>, handler: Arc<ChangeHandler<C>>, max_results: u32) -> Self {
        Self {
            calendar,
            handler,
            max_results,
        }
    }

    /// Push every snapshot event whose summary is not already on the
    /// calendar. Matching is by summary text, not id, so calendars
    /// seeded before the bot first ran are tolerated (see IdentityPolicy
    /// for the trade-off).
    pub async fn run(&self, snapshot: &[SourceEvent]) -> BotResult<ReconcileReport> {
        let window = self
            .calendar
            .list_upcoming(Utc::now(), self.max_results)
            .await?;

        let mut report = ReconcileReport::default();
        for event in snapshot {
            let summary = self.handler.transcoder().summary_for(&event.name);
            if IdentityPolicy::is_represented(&window, &summary) {
                debug!("calendar already has '{}', skipping", summary);
                report.skipped += 1;
            } else {
                self.handler.on_create(event).await?;
                report.created += 1;
            }
        }

        info!(
            "Reconciliation complete: {} created, {} already present",
            report.created, report.skipped
        );
        Ok(report)
    }
}
