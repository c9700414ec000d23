use super::handler::ChangeHandler;
use super::models::{SourceChange, SourceEvent};
use super::reconcile::ReconciliationEngine;
use super::transcode::EventTranscoder;
use crate::calendar::CalendarApi;
use crate::error::{calendar_error, BotResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Commands that can be sent to the sync actor
pub enum SyncCommand {
    /// The gateway is ready: wire the transcoder, reconcile the
    /// snapshot, then start applying changes
    Start {
        transcoder: EventTranscoder,
        max_results: u32,
        snapshot: Vec<SourceEvent>,
    },
    Apply(SourceChange),
    Shutdown,
}

/// Handle for communicating with the sync actor
#[derive(Clone)]
pub struct SyncActorHandle {
    command_tx: mpsc::Sender<SyncCommand>,
}

impl SyncActorHandle {
    /// Wire the pipeline and queue the startup reconciliation pass
    pub async fn start(
        &self,
        transcoder: EventTranscoder,
        max_results: u32,
        snapshot: Vec<SourceEvent>,
    ) -> BotResult<()> {
        self.command_tx
            .send(SyncCommand::Start {
                transcoder,
                max_results,
                snapshot,
            })
            .await
            .map_err(|e| calendar_error(&format!("Actor mailbox error: {}", e)))
    }

    /// Queue a live lifecycle change
    pub async fn apply(&self, change: SourceChange) -> BotResult<()> {
        self.command_tx
            .send(SyncCommand::Apply(change))
            .await
            .map_err(|e| calendar_error(&format!("Actor mailbox error: {}", e)))
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(SyncCommand::Shutdown).await;
        Ok(())
    }
}

/// The sync actor that processes lifecycle changes one at a time.
///
/// All calendar mutations funnel through this single consumer task, so
/// no two changes are ever in flight at once and no per-event locking
/// is needed. The actor exists before the gateway connects, so a
/// change delivered while the connection is still being established
/// queues in the mailbox instead of being lost. Changes received ahead
/// of the Start command are buffered and applied, in arrival order,
/// right after reconciliation completes.
pub struct SyncActor<C: CalendarApi> {
    calendar: Arc<C>,
    handler: Option<Arc<ChangeHandler<C>>>,
    pending: Vec<SourceChange>,
    command_rx: mpsc::Receiver<SyncCommand>,
}

impl<C: CalendarApi> SyncActor<C> {
    /// Create a new actor and return its handle
    pub fn new(calendar: Arc<C>) -> (Self, SyncActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);

        let actor = Self {
            calendar,
            handler: None,
            pending: Vec::new(),
            command_rx,
        };

        let handle = SyncActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Sync actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                SyncCommand::Start {
                    transcoder,
                    max_results,
                    snapshot,
                } => {
                    let handler =
                        Arc::new(ChangeHandler::new(Arc::clone(&self.calendar), transcoder));
                    let engine = ReconciliationEngine::new(
                        Arc::clone(&self.calendar),
                        Arc::clone(&handler),
                        max_results,
                    );

                    if let Err(e) = engine.run(&snapshot).await {
                        error!("Reconciliation failed: {:?}", e);
                    }

                    // Changes that raced the connection handshake apply
                    // now, after the backfill, in their arrival order
                    for change in self.pending.drain(..) {
                        apply_change(&handler, change).await;
                    }

                    self.handler = Some(handler);
                }
                SyncCommand::Apply(change) => match &self.handler {
                    Some(handler) => apply_change(handler, change).await,
                    None => {
                        debug!("Gateway not ready, buffering change for '{}'", change.event_name());
                        self.pending.push(change);
                    }
                },
                SyncCommand::Shutdown => {
                    info!("Sync actor shutting down");
                    break;
                }
            }
        }

        info!("Sync actor shut down");
    }
}

async fn apply_change<C: CalendarApi>(handler: &Arc<ChangeHandler<C>>, change: SourceChange) {
    let name = change.event_name().to_string();
    if let Err(e) = handler.apply(change).await {
        error!("Failed to sync scheduled event '{}': {:?}", name, e);
    }
}
