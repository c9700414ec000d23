use crate::config::Config;
use crate::error::{transcode_error, BotResult};
use crate::sync::{
    EventTranscoder, SourceChange, SourceEvent, SourceLocation, SyncActorHandle,
};
use chrono::{DateTime, Utc};
use serenity::all::{
    ActivityData, Context, EventHandler, GuildId, OnlineStatus, Ready, ScheduledEvent,
    ScheduledEventType, Timestamp,
};
use serenity::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Gateway adapter between serenity and the sync core. The sync actor
/// is spawned before the gateway connects, so every scheduled-event
/// change can be forwarded into its mailbox immediately; the actor
/// buffers anything that arrives before `ready` finishes wiring the
/// transcoder and reconciling the snapshot.
pub struct Handler {
    config: Arc<RwLock<Config>>,
    sync: SyncActorHandle,
}

impl Handler {
    pub fn new(config: Arc<RwLock<Config>>, sync: SyncActorHandle) -> Self {
        Self { config, sync }
    }

    /// Convert a gateway notification and queue it on the sync actor
    async fn dispatch(
        &self,
        ctx: &Context,
        event: ScheduledEvent,
        change: fn(SourceEvent) -> SourceChange,
    ) {
        let guild_id = {
            let config_read = self.config.read().await;
            config_read.guild_id
        };
        if event.guild_id.get() != guild_id {
            return;
        }

        match source_event(ctx, &event).await {
            Ok(source) => {
                if let Err(e) = self.sync.apply(change(source)).await {
                    error!("Failed to queue change for '{}': {:?}", event.name, e);
                }
            }
            Err(e) => {
                error!("Skipping malformed scheduled event '{}': {:?}", event.name, e);
            }
        }
    }
}

/// Convert a gateway timestamp to a UTC instant. Serenity timestamps
/// are `time`-based; the sync core speaks chrono, so the conversion
/// goes through the unix epoch.
pub fn utc_instant(timestamp: &Timestamp) -> BotResult<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), timestamp.nanosecond())
        .ok_or_else(|| transcode_error("timestamp out of range"))
}

/// Map a serenity scheduled event into the sync core's source model,
/// resolving the voice channel name. Fails fast on a voice event with
/// no channel or an external event with no location; the transcoder
/// does not guess defaults for either.
async fn source_event(ctx: &Context, event: &ScheduledEvent) -> BotResult<SourceEvent> {
    let location = match event.kind {
        ScheduledEventType::Voice => {
            let channel_id = event.channel_id.ok_or_else(|| {
                transcode_error(&format!("voice event '{}' has no channel", event.name))
            })?;
            SourceLocation::VoiceChannel(channel_id.name(ctx).await?)
        }
        _ => {
            let place = event
                .metadata
                .as_ref()
                .and_then(|m| m.location.clone())
                .ok_or_else(|| {
                    transcode_error(&format!("event '{}' has no location", event.name))
                })?;
            SourceLocation::External(place)
        }
    };

    let end = match &event.end_time {
        Some(end_time) => Some(utc_instant(end_time)?),
        None => None,
    };

    Ok(SourceEvent {
        id: event.id.get(),
        name: event.name.clone(),
        description: event.description.clone(),
        start: utc_instant(&event.start_time)?,
        end,
        location,
    })
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("We have logged in as {}", ready.user.name);

        let (guild_id, activity, max_results) = {
            let config_read = self.config.read().await;
            (
                GuildId::new(config_read.guild_id),
                config_read.activity.clone(),
                config_read.reconcile_max_results,
            )
        };

        ctx.set_presence(Some(ActivityData::playing(&activity)), OnlineStatus::Online);

        // The guild display name is baked into every calendar summary
        // and never changes for the lifetime of the process.
        let guild = match ctx.http.get_guild(guild_id).await {
            Ok(guild) => guild,
            Err(e) => {
                error!("Failed to fetch guild {}: {:?}", guild_id, e);
                return;
            }
        };

        let scheduled = match guild_id.scheduled_events(&ctx.http, false).await {
            Ok(events) => events,
            Err(e) => {
                error!("Failed to fetch scheduled events: {:?}", e);
                Vec::new()
            }
        };

        let mut snapshot = Vec::with_capacity(scheduled.len());
        for event in &scheduled {
            match source_event(&ctx, event).await {
                Ok(source) => snapshot.push(source),
                Err(e) => {
                    error!("Skipping malformed scheduled event '{}': {:?}", event.name, e);
                }
            }
        }

        info!(
            "Reconciling {} scheduled events for guild '{}'",
            snapshot.len(),
            guild.name
        );
        let transcoder = EventTranscoder::new(&guild.name);
        if let Err(e) = self.sync.start(transcoder, max_results, snapshot).await {
            error!("Failed to start sync pipeline: {:?}", e);
        }
    }

    async fn guild_scheduled_event_create(&self, ctx: Context, event: ScheduledEvent) {
        self.dispatch(&ctx, event, SourceChange::Created).await;
    }

    // The gateway update payload carries only the new state. Discord
    // keeps scheduled-event ids stable, so the same event serves as
    // both the addressing key and the replacement value.
    async fn guild_scheduled_event_update(&self, ctx: Context, event: ScheduledEvent) {
        self.dispatch(&ctx, event, |source| SourceChange::Updated {
            old: source.clone(),
            new: source,
        })
        .await;
    }

    async fn guild_scheduled_event_delete(&self, ctx: Context, event: ScheduledEvent) {
        self.dispatch(&ctx, event, SourceChange::Deleted).await;
    }
}
