use super::models::{SourceEvent, TargetEvent};

/// How Discord event identity maps onto calendar event identity.
///
/// Two strategies are in play at different times. Live updates and
/// deletes address the calendar by exact id, which works because every
/// event this bot creates uses the Discord event id as its calendar id.
/// Startup reconciliation instead matches by summary text, because the
/// calendar may have been seeded by hand before the bot ever ran and
/// those entries carry calendar-assigned ids. Summary matching cannot
/// see a renamed event and can false-positive on a coincidental title
/// collision; it is kept as-is deliberately rather than silently
/// replaced with something stricter.
pub struct IdentityPolicy;

impl IdentityPolicy {
    /// The calendar event id for a source event (exact-id strategy)
    pub fn target_event_id(event: &SourceEvent) -> String {
        event.id.to_string()
    }

    /// Whether a transcoded summary is already present in the fetched
    /// calendar window (bulk-reconciliation strategy)
    pub fn is_represented(window: &[TargetEvent], summary: &str) -> bool {
        window.iter().any(|event| event.summary == summary)
    }
}
