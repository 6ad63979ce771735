//! One authorised session: the shared service handles plus the two loops using them.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    catalog::{CatalogService, QueuedTrack},
    inference::InferenceService,
    log_ring::{LogRing, UI_LOG_LINES},
    pipeline::RequestPipeline,
    queue::QueueManager,
    refiner::RequestRefiner,
    resolver::TrackResolver,
    status::{PollerConfig, StatusPoller},
    tailer::TailerConfig,
};

/// Handles shared by both loops for the lifetime of a session.
///
/// The service clients are only read after the session starts; nothing
/// replaces them until the session is stopped and a new one is built.
#[derive(Clone)]
pub struct SessionContext {
    pub catalog: Arc<dyn CatalogService>,
    pub inference: Arc<dyn InferenceService>,
    pub log: LogRing,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tailer: TailerConfig,
    pub poller: PollerConfig,
}

/// A running session. Dropping it stops both loops.
pub struct Session {
    context: SessionContext,
    queue: QueueManager,
    tasks: Vec<JoinHandle<()>>,
}

impl Session {
    /// Spawn the request loop and the status loop on the current runtime.
    pub fn start(context: SessionContext, config: SessionConfig) -> Self {
        let SessionContext {
            catalog,
            inference,
            log,
        } = context.clone();

        let pipeline = RequestPipeline::new(
            config.tailer.markers.clone(),
            RequestRefiner::new(inference, log.clone()),
            TrackResolver::new(Arc::clone(&catalog), log.clone()),
            QueueManager::new(Arc::clone(&catalog), log.clone()),
            log.clone(),
        );
        let tailer = config.tailer;
        let request_loop = tokio::spawn(async move { pipeline.run(tailer).await });

        let poller = StatusPoller::new(Arc::clone(&catalog), config.poller, log.clone());
        let status_loop = tokio::spawn(poller.run());

        log.info("Session started");
        Self {
            queue: QueueManager::new(catalog, log),
            context,
            tasks: vec![request_loop, status_loop],
        }
    }

    /// The newest log lines, newest first.
    #[must_use]
    pub fn recent_logs(&self) -> Vec<String> {
        self.context.log.recent(UI_LOG_LINES)
    }

    /// A fresh read of the playback queue; empty if it cannot be read.
    pub async fn current_queue(&self) -> Vec<QueuedTrack> {
        self.queue.snapshot().await
    }

    /// The catalog access token, or an empty string if it is unavailable.
    pub async fn access_token(&self) -> String {
        self.context.catalog.access_token().await.unwrap_or_else(|e| {
            self.context
                .log
                .error(format!("Error retrieving access token: {e:#}"));
            String::new()
        })
    }

    /// Stop both loops and wait for them to release their files.
    pub async fn stop(mut self) {
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    self.context.log.error(format!("Session task failed: {e}"));
                }
            }
        }
        self.context.log.info("Session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
