//! Queue message dispatch
//!
//! Messages are consumed at most once: decode errors, unknown channels and
//! failed runs are logged and the message is dropped, never requeued.

use core_sync::{SyncCoordinator, SyncReport};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::{Result, ServiceError};

/// Drives a by-user sync
pub const USER_SYNC_CHANNEL: &str = "spotify-user";
/// Logged only; no pipeline is attached
pub const ARTIST_SYNC_CHANNEL: &str = "spotify-artist";

#[derive(Debug, Deserialize)]
struct UserMessage {
    #[serde(alias = "ID", alias = "Id", alias = "iD")]
    id: String,
}

#[derive(Debug)]
pub enum DispatchOutcome {
    /// The run finished; the report may still list failed artists
    Synced(SyncReport),
    Logged,
    Dropped,
}

impl DispatchOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, DispatchOutcome::Dropped)
    }
}

pub struct MessageDispatcher {
    coordinator: Arc<SyncCoordinator>,
}

impl MessageDispatcher {
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        Self { coordinator }
    }

    #[instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn dispatch(&self, channel: &str, body: &[u8]) -> DispatchOutcome {
        match channel {
            USER_SYNC_CHANNEL => self.handle_user(body).await,
            ARTIST_SYNC_CHANNEL => {
                info!(body = %String::from_utf8_lossy(body), "Received artist sync message");
                DispatchOutcome::Logged
            }
            other => {
                warn!(channel = other, "Dropping message from unknown channel");
                DispatchOutcome::Dropped
            }
        }
    }

    async fn handle_user(&self, body: &[u8]) -> DispatchOutcome {
        let message = match parse_user_message(body) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, "Failed to decode user sync message");
                return DispatchOutcome::Dropped;
            }
        };

        info!(user_id = %message.id, "Received user sync message");
        match self.coordinator.sync_user(&message.id).await {
            Ok(report) => {
                info!(
                    user_id = %message.id,
                    run_id = %report.run_id,
                    succeeded = report.succeeded.len(),
                    failed = report.failed.len(),
                    "User sync finished"
                );
                DispatchOutcome::Synced(report)
            }
            Err(e) => {
                error!(user_id = %message.id, error = %e, "User sync failed, dropping message");
                DispatchOutcome::Dropped
            }
        }
    }
}

fn parse_user_message(body: &[u8]) -> Result<UserMessage> {
    let message: UserMessage = serde_json::from_slice(body)?;
    if message.id.trim().is_empty() {
        return Err(ServiceError::InvalidArgument("user id must not be empty"));
    }
    Ok(message)
}
