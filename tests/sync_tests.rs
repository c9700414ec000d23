mod common;

use calbridge::sync::{
    ChangeHandler, EventTranscoder, ReconciliationEngine, SourceChange, SourceLocation, SyncActor,
};
use common::{external_event, manual_entry, voice_event, MockCalendar};
use std::sync::Arc;

fn handler(calendar: &Arc<MockCalendar>) -> Arc<ChangeHandler<MockCalendar>> {
    Arc::new(ChangeHandler::new(
        Arc::clone(calendar),
        EventTranscoder::new("MyServer"),
    ))
}

fn engine(
    calendar: &Arc<MockCalendar>,
    handler: &Arc<ChangeHandler<MockCalendar>>,
) -> ReconciliationEngine<MockCalendar> {
    ReconciliationEngine::new(Arc::clone(calendar), Arc::clone(handler), 50)
}

/// Every transcoded event carries the stringified Discord id, which is
/// what update and delete later address the calendar by
#[test]
fn test_transcode_identity_invariant() {
    let transcoder = EventTranscoder::new("MyServer");

    for event in [
        voice_event(42, "Game Night", "lounge", 20),
        external_event(7, "Picnic", "Central Park", 12),
    ] {
        let target = transcoder.transcode(&event).unwrap();
        assert_eq!(target.id, event.id.to_string());
    }
}

/// The worked example: a voice event becomes a zero-duration marker at
/// its start time, with the channel-glyph location
#[test]
fn test_transcode_voice_event() {
    let transcoder = EventTranscoder::new("MyServer");
    let event = voice_event(42, "Game Night", "lounge", 20);

    let target = transcoder.transcode(&event).unwrap();
    assert_eq!(target.id, "42");
    assert_eq!(target.summary, "Discord (MyServer): Game Night");
    assert_eq!(target.location, "🔉 lounge");
    assert_eq!(target.start.date_time, "2024-06-01T20:00:00Z");
    assert_eq!(target.end, target.start);
    assert_eq!(target.start.time_zone, "UTC");
    assert_eq!(target.end.time_zone, "UTC");
}

#[test]
fn test_transcode_external_event() {
    let transcoder = EventTranscoder::new("MyServer");
    let event = external_event(7, "Picnic", "Central Park", 12);

    let target = transcoder.transcode(&event).unwrap();
    assert_eq!(target.location, "📍 Central Park");
    assert_eq!(target.start.date_time, "2024-06-01T12:00:00Z");
    assert_eq!(target.end.date_time, "2024-06-01T13:00:00Z");
}

/// An external event with no end time is malformed; the transcoder
/// refuses rather than inventing a duration
#[test]
fn test_transcode_external_event_without_end_fails() {
    let transcoder = EventTranscoder::new("MyServer");
    let mut event = external_event(7, "Picnic", "Central Park", 12);
    event.end = None;

    assert!(transcoder.transcode(&event).is_err());
}

#[test]
fn test_transcode_copies_description() {
    let transcoder = EventTranscoder::new("MyServer");
    let mut event = external_event(7, "Picnic", "Central Park", 12);
    event.description = Some("Bring snacks".to_string());

    let target = transcoder.transcode(&event).unwrap();
    assert_eq!(target.description.as_deref(), Some("Bring snacks"));
}

/// A redelivered create converges through the conflict fallback
/// instead of failing, leaving exactly one calendar event
#[tokio::test]
async fn test_on_create_is_idempotent() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);
    let event = voice_event(42, "Game Night", "lounge", 20);

    handler.on_create(&event).await.unwrap();
    handler.on_create(&event).await.unwrap();

    let events = calendar.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "42");

    let calls = calendar.calls();
    assert_eq!(calls.insert, 2);
    assert_eq!(calls.update, 1);
}

/// Deleting a missing or already-deleted event is success
#[tokio::test]
async fn test_on_delete_is_idempotent() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);
    let event = voice_event(42, "Game Night", "lounge", 20);

    // Never created: still fine
    handler.on_delete(&event).await.unwrap();

    handler.on_create(&event).await.unwrap();
    handler.on_delete(&event).await.unwrap();
    handler.on_delete(&event).await.unwrap();

    assert!(calendar.events().is_empty());
}

#[tokio::test]
async fn test_on_update_replaces_fields() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);

    let old = voice_event(42, "Game Night", "lounge", 20);
    handler.on_create(&old).await.unwrap();

    let mut new = old.clone();
    new.name = "Game Night (Postponed)".to_string();
    new.location = SourceLocation::VoiceChannel("den".to_string());
    handler.on_update(&old, &new).await.unwrap();

    let stored = calendar.find("42").unwrap();
    assert_eq!(stored.summary, "Discord (MyServer): Game Night (Postponed)");
    assert_eq!(stored.location, "🔉 den");
}

/// Defensive: the calendar is addressed by the old id even if the new
/// event claims a different one. Discord ids are stable so this should
/// never happen, but it must not corrupt the mapping if it does.
#[tokio::test]
async fn test_on_update_addresses_by_old_id() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);

    let old = voice_event(42, "Game Night", "lounge", 20);
    handler.on_create(&old).await.unwrap();

    let mut new = old.clone();
    new.id = 43;
    new.name = "Renamed".to_string();
    handler.on_update(&old, &new).await.unwrap();

    assert!(calendar.find("42").is_some());
    assert!(calendar.find("43").is_none());
    assert_eq!(
        calendar.find("42").unwrap().summary,
        "Discord (MyServer): Renamed"
    );
}

/// An update for an event that was never mirrored surfaces an error; a
/// missed create is not silently healed
#[tokio::test]
async fn test_on_update_missing_event_is_an_error() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);
    let event = voice_event(42, "Game Night", "lounge", 20);

    let err = handler.on_update(&event, &event).await.unwrap_err();
    assert!(err.is_not_found());
}

/// All three lifecycle notifications flow through the one apply entry
/// point
#[tokio::test]
async fn test_apply_dispatches_lifecycle() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);

    let event = voice_event(42, "Game Night", "lounge", 20);
    handler
        .apply(SourceChange::Created(event.clone()))
        .await
        .unwrap();
    assert_eq!(calendar.events().len(), 1);

    let mut renamed = event.clone();
    renamed.name = "Game Night (Postponed)".to_string();
    handler
        .apply(SourceChange::Updated {
            old: event.clone(),
            new: renamed,
        })
        .await
        .unwrap();
    assert_eq!(
        calendar.find("42").unwrap().summary,
        "Discord (MyServer): Game Night (Postponed)"
    );

    handler.apply(SourceChange::Deleted(event)).await.unwrap();
    assert!(calendar.events().is_empty());
}

/// Empty calendar: every snapshot event is created
#[tokio::test]
async fn test_reconcile_empty_calendar_creates_all() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);
    let engine = engine(&calendar, &handler);

    let snapshot = vec![
        voice_event(1, "Standup", "lounge", 9),
        voice_event(2, "Game Night", "lounge", 20),
        external_event(3, "Picnic", "Central Park", 12),
    ];

    let report = engine.run(&snapshot).await.unwrap();
    assert_eq!(report.created, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(calendar.events().len(), 3);
    assert_eq!(calendar.calls().insert, 3);
}

/// A calendar seeded out-of-band with a matching summary is trusted,
/// even though that entry's id is not the Discord event id. Summary
/// matching is the reconciliation contract, for better or worse.
#[tokio::test]
async fn test_reconcile_skips_matching_summary() {
    let seeded = manual_entry("abc123def", "Discord (MyServer): Game Night");
    let calendar = Arc::new(MockCalendar::with_events(vec![seeded]));
    let handler = handler(&calendar);
    let engine = engine(&calendar, &handler);

    let snapshot = vec![
        voice_event(1, "Standup", "lounge", 9),
        voice_event(2, "Game Night", "lounge", 20),
        external_event(3, "Picnic", "Central Park", 12),
    ];

    let report = engine.run(&snapshot).await.unwrap();
    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(calendar.calls().insert, 2);

    // The seeded entry is untouched and "Game Night" was not duplicated
    assert!(calendar.find("abc123def").is_some());
    assert!(calendar.find("2").is_none());
}

/// Reconciliation is additive: calendar events with no Discord
/// counterpart are left in place
#[tokio::test]
async fn test_reconcile_leaves_orphans_alone() {
    let orphan = manual_entry("orphan1", "Yoga class");
    let calendar = Arc::new(MockCalendar::with_events(vec![orphan]));
    let handler = handler(&calendar);
    let engine = engine(&calendar, &handler);

    let report = engine
        .run(&[voice_event(1, "Standup", "lounge", 9)])
        .await
        .unwrap();
    assert_eq!(report.created, 1);

    assert!(calendar.find("orphan1").is_some());
    assert_eq!(calendar.calls().delete, 0);
}

/// A change delivered while the gateway handshake is still in flight
/// queues in the actor's mailbox and is applied once the pipeline is
/// wired, not dropped
#[tokio::test]
async fn test_actor_buffers_changes_until_started() {
    let calendar = Arc::new(MockCalendar::new());
    let (mut actor, handle) = SyncActor::new(Arc::clone(&calendar));
    let task = tokio::spawn(async move {
        actor.run().await;
    });

    // The create arrives before the snapshot and guild name are known
    handle
        .apply(SourceChange::Created(voice_event(42, "Game Night", "lounge", 20)))
        .await
        .unwrap();
    handle
        .start(EventTranscoder::new("MyServer"), 50, Vec::new())
        .await
        .unwrap();

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(calendar.events().len(), 1);
    assert!(calendar.find("42").is_some());
}

/// Reconciliation runs before any buffered change: a delete that raced
/// the handshake removes the event the snapshot backfilled, so the end
/// state matches the order Discord emitted
#[tokio::test]
async fn test_actor_reconciles_before_buffered_changes() {
    let calendar = Arc::new(MockCalendar::new());
    let (mut actor, handle) = SyncActor::new(Arc::clone(&calendar));
    let task = tokio::spawn(async move {
        actor.run().await;
    });

    let event = voice_event(42, "Game Night", "lounge", 20);
    handle
        .apply(SourceChange::Deleted(event.clone()))
        .await
        .unwrap();
    handle
        .start(EventTranscoder::new("MyServer"), 50, vec![event])
        .await
        .unwrap();

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    // Backfilled first, then deleted by the buffered change
    assert_eq!(calendar.calls().insert, 1);
    assert!(calendar.events().is_empty());
}

/// Running reconciliation twice converges: the second pass matches the
/// summaries created by the first and issues no inserts
#[tokio::test]
async fn test_reconcile_twice_is_stable() {
    let calendar = Arc::new(MockCalendar::new());
    let handler = handler(&calendar);
    let engine = engine(&calendar, &handler);

    let snapshot = vec![
        voice_event(1, "Standup", "lounge", 9),
        external_event(3, "Picnic", "Central Park", 12),
    ];

    engine.run(&snapshot).await.unwrap();
    let report = engine.run(&snapshot).await.unwrap();

    assert_eq!(report.created, 0);
    assert_eq!(report.skipped, 2);
    assert_eq!(calendar.events().len(), 2);
}
