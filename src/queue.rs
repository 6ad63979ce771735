//! Duplicate-aware additions to the live playback queue.
//!
//! The queue belongs to the remote player and other clients may change it at
//! any time, so every check reads a fresh snapshot. Two producers adding the
//! same track at once can still both succeed.

use std::sync::Arc;

use crate::{
    catalog::{CatalogService, QueuedTrack},
    log_ring::LogRing,
    resolver::ResolvedTrack,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Added,
    AlreadyQueued,
    Failed,
}

pub struct QueueManager {
    catalog: Arc<dyn CatalogService>,
    log: LogRing,
}

impl QueueManager {
    pub fn new(catalog: Arc<dyn CatalogService>, log: LogRing) -> Self {
        Self { catalog, log }
    }

    /// Current queue contents, or an empty queue if it cannot be read.
    pub async fn snapshot(&self) -> Vec<QueuedTrack> {
        self.catalog.queue().await.unwrap_or_else(|e| {
            self.log.error(format!("Error retrieving queue: {e:#}"));
            Vec::new()
        })
    }

    /// Add `track` unless the queue already holds it.
    ///
    /// An unreadable queue is treated as empty.
    pub async fn enqueue_if_absent(&self, track: &ResolvedTrack) -> EnqueueOutcome {
        let queued = match self.catalog.queue().await {
            Ok(q) => q,
            Err(e) => {
                self.log.error(format!("Error checking queue: {e:#}"));
                Vec::new()
            }
        };
        if queued.iter().any(|t| t.uri == track.uri) {
            self.log.info(format!("Song already in queue: {}", track.uri));
            return EnqueueOutcome::AlreadyQueued;
        }
        match self.catalog.add_to_queue(&track.uri).await {
            Ok(()) => {
                self.log.info(format!("Added to queue: {}", track.uri));
                EnqueueOutcome::Added
            }
            Err(e) => {
                self.log
                    .error(format!("Error adding song to queue: {e:#}"));
                EnqueueOutcome::Failed
            }
        }
    }
}
