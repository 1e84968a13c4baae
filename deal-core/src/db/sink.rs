//! Persistence of override records after each mutation.
//!
//! Writes are fire-and-forget: the session never waits on them and a failed
//! write is logged, not retried. A single writer task drains them in
//! submission order, so the stored record is always the last one submitted.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

use super::repository::PropertyRepository;
use crate::models::{ListingId, PropertyOverride};

/// Receives every new override record for a property.
pub trait OverrideSink: Send + Sync {
    fn submit(
        &self,
        listing_id: &ListingId,
        overrides: &PropertyOverride,
    );
}

enum SinkMessage {
    Save {
        listing_id: ListingId,
        overrides: PropertyOverride,
    },
    Flush(oneshot::Sender<()>),
}

/// Writes overrides through a [`PropertyRepository`] on a background task.
pub struct RepositorySink {
    sender: mpsc::UnboundedSender<SinkMessage>,
}

impl RepositorySink {
    /// Starts the writer task on `handle`.
    pub fn new(
        repository: Arc<dyn PropertyRepository>,
        handle: Handle,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        handle.spawn(run_writer(repository, receiver));
        Self { sender }
    }

    /// Waits for every write submitted so far. Call before the runtime shuts
    /// down so the last edit is not lost.
    pub async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.sender.send(SinkMessage::Flush(done)).is_err() {
            error!("override writer has stopped, nothing to flush");
            return;
        }
        if finished.await.is_err() {
            error!("override writer stopped before flushing");
        }
    }
}

impl OverrideSink for RepositorySink {
    fn submit(
        &self,
        listing_id: &ListingId,
        overrides: &PropertyOverride,
    ) {
        let message = SinkMessage::Save {
            listing_id: listing_id.clone(),
            overrides: overrides.clone(),
        };
        if self.sender.send(message).is_err() {
            error!(listing = %listing_id, "override writer has stopped, write dropped");
        }
    }
}

async fn run_writer(
    repository: Arc<dyn PropertyRepository>,
    mut receiver: mpsc::UnboundedReceiver<SinkMessage>,
) {
    while let Some(message) = receiver.recv().await {
        match message {
            SinkMessage::Save {
                listing_id,
                overrides,
            } => match repository.save_override(&listing_id, &overrides).await {
                Ok(()) => debug!(listing = %listing_id, "persisted override"),
                Err(e) => error!(listing = %listing_id, error = %e, "failed to persist override"),
            },
            SinkMessage::Flush(done) => {
                // The flusher may have given up waiting.
                let _ = done.send(());
            }
        }
    }
}
