//! # Lifecycle Events
//!
//! Credential and sync-run events published over `tokio::sync::broadcast`.
//!
//! Publishing never blocks and never fails a run: with no subscriber the send
//! error is discarded, and a subscriber that falls more than the buffer
//! behind receives `RecvError::Lagged` and resumes from the oldest retained
//! event.
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
//!
//! let bus = EventBus::new(16);
//! let mut events = bus.subscribe();
//!
//! bus.emit(CoreEvent::Sync(SyncEvent::Failed {
//!     run_id: "run-1".to_string(),
//!     message: "provider unavailable".to_string(),
//! }))
//! .ok();
//!
//! assert!(events.try_recv().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Credential events
    Auth(AuthEvent),
    /// Sync run events
    Sync(SyncEvent),
}

impl CoreEvent {
    /// Run the event belongs to; credential events carry none
    pub fn run_id(&self) -> Option<&str> {
        match self {
            CoreEvent::Auth(_) => None,
            CoreEvent::Sync(event) => Some(event.run_id()),
        }
    }
}

/// Events related to credential acquisition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    /// A credential was issued for a sync run.
    CredentialAcquired {
        /// `"app"` or `"user"`.
        kind: String,
        /// Internal user id for delegated credentials.
        user_id: Option<String>,
        /// Expiry as Unix epoch seconds, when known.
        expires_at: Option<i64>,
    },
    /// An expired credential was replaced mid-run.
    CredentialReacquired {
        kind: String,
        user_id: Option<String>,
    },
    /// Credential acquisition failed.
    AuthError {
        user_id: Option<String>,
        message: String,
    },
}

/// Events related to a synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// Run initiated.
    Started {
        run_id: String,
        /// `"user"` or `"artist"`.
        trigger: String,
        /// User id or external artist id the run was triggered for.
        subject: String,
    },
    /// One artist committed.
    ArtistReconciled {
        run_id: String,
        external_id: String,
        /// `true` when a new row was created, `false` for an update.
        created: bool,
    },
    /// One artist sub-pipeline failed.
    ArtistFailed {
        run_id: String,
        external_id: String,
        message: String,
    },
    /// Run finished; failures may be non-zero under the continue policy.
    Completed {
        run_id: String,
        succeeded: u64,
        failed: u64,
        skipped: u64,
        duration_ms: u64,
    },
    /// Run aborted.
    Failed { run_id: String, message: String },
}

impl SyncEvent {
    /// Run identifier shared by all events of one run.
    pub fn run_id(&self) -> &str {
        match self {
            SyncEvent::Started { run_id, .. }
            | SyncEvent::ArtistReconciled { run_id, .. }
            | SyncEvent::ArtistFailed { run_id, .. }
            | SyncEvent::Completed { run_id, .. }
            | SyncEvent::Failed { run_id, .. } => run_id,
        }
    }
}

/// Cloneable publisher; every clone feeds the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of subscribers reached; `Err` only when there are none
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event).inspect_err(|dropped| {
            tracing::trace!(run_id = ?dropped.0.run_id(), "Event dropped, no subscribers");
        })
    }

    /// Past events are not replayed
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(run_id: &str) -> CoreEvent {
        CoreEvent::Sync(SyncEvent::Completed {
            run_id: run_id.to_string(),
            succeeded: 2,
            failed: 0,
            skipped: 0,
            duration_ms: 15,
        })
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(completed("run-1")).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_event() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.emit(completed("run-1")).unwrap(), 2);

        assert_eq!(first.recv().await.unwrap(), completed("run-1"));
        assert_eq!(second.recv().await.unwrap(), completed("run-1"));
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut subscriber = bus.subscribe();

        for i in 0..5 {
            bus.emit(completed(&format!("run-{}", i))).ok();
        }

        assert!(matches!(
            subscriber.recv().await,
            Err(RecvError::Lagged(_))
        ));
    }

    #[test]
    fn test_run_id_only_on_sync_events() {
        let acquired = CoreEvent::Auth(AuthEvent::CredentialAcquired {
            kind: "app".to_string(),
            user_id: None,
            expires_at: Some(1_700_000_000),
        });
        assert_eq!(acquired.run_id(), None);
        assert_eq!(completed("run-9").run_id(), Some("run-9"));
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = CoreEvent::Sync(SyncEvent::ArtistReconciled {
            run_id: "run-7".to_string(),
            external_id: "artist-1".to_string(),
            created: true,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Sync");
        assert_eq!(json["payload"]["event"], "ArtistReconciled");
        assert_eq!(json["payload"]["external_id"], "artist-1");

        let back: CoreEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_run_id_accessor() {
        let event = SyncEvent::Started {
            run_id: "run-3".to_string(),
            trigger: "user".to_string(),
            subject: "user-1".to_string(),
        };
        assert_eq!(event.run_id(), "run-3");
    }
}
