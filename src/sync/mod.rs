mod actor;
mod handler;
mod identity;
pub mod models;
mod reconcile;
pub mod transcode;

pub use actor::{SyncActor, SyncActorHandle};
pub use handler::ChangeHandler;
pub use identity::IdentityPolicy;
pub use models::{SourceChange, SourceEvent, SourceLocation, TargetEvent};
pub use reconcile::{ReconcileReport, ReconciliationEngine};
pub use transcode::EventTranscoder;
