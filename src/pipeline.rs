//! From detected chat line to queued track.


use std::{pin::pin, time::Duration};

use futures_lite::StreamExt as _;
use tokio::time::sleep;

use crate::{
    log_ring::LogRing,
    queue::{EnqueueOutcome, QueueManager},
    refiner::RequestRefiner,
    request::{RequestMarkers, SongRequest},
    resolver::{ResolvedTrack, TrackResolver},
    tailer::{tail, TailerConfig},
};

/// Wait before reopening the chat log after its stream ended.
const RESTART_DELAY: Duration = Duration::from_secs(1);

/// How a single request line was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Queued(String),
    AlreadyQueued(String),
    /// Dropped as a joke request
    Troll,
    /// Neither the refined nor the original request matched a track
    NotFound,
    /// The line held no usable request
    Invalid,
    QueueFailed(String),
}

pub struct RequestPipeline {
    markers: RequestMarkers,
    refiner: RequestRefiner,
    resolver: TrackResolver,
    queue: QueueManager,
    log: LogRing,
}

impl RequestPipeline {
    pub fn new(
        markers: RequestMarkers,
        refiner: RequestRefiner,
        resolver: TrackResolver,
        queue: QueueManager,
        log: LogRing,
    ) -> Self {
        Self {
            markers,
            refiner,
            resolver,
            queue,
            log,
        }
    }

    /// Handle one request line. Every failure is logged and folded into the outcome.
    pub async fn process_line(&self, line: &str) -> RequestOutcome {
        let original = match self.markers.parse(line) {
            Ok(request) => request,
            Err(e) => {
                self.log.warn(format!("Error processing request: {e:#}"));
                return RequestOutcome::Invalid;
            }
        };
        self.log.info(format!(
            "Processing request: Song='{}', Artist='{}'",
            original.song,
            original.artist_or_unknown()
        ));

        let refined = self.refiner.refine(&original).await;
        if self.refiner.is_troll(&refined).await {
            self.log.info(format!("Skipping troll song: {refined}"));
            return RequestOutcome::Troll;
        }

        let Some(track) = self.resolve(&refined, &original).await else {
            return RequestOutcome::NotFound;
        };
        match self.queue.enqueue_if_absent(&track).await {
            EnqueueOutcome::Added => RequestOutcome::Queued(track.uri),
            EnqueueOutcome::AlreadyQueued => RequestOutcome::AlreadyQueued(track.uri),
            EnqueueOutcome::Failed => RequestOutcome::QueueFailed(track.uri),
        }
    }

    /// Try the refined request first and the user's own wording second.
    async fn resolve(&self, refined: &SongRequest, original: &SongRequest) -> Option<ResolvedTrack> {
        if let Some(track) = self.resolver.resolve(refined).await {
            return Some(track);
        }
        self.log.info(format!("Refined song not found: {refined}"));
        let track = self.resolver.resolve(original).await;
        if track.is_none() {
            self.log.info(format!("Original song not found: {original}"));
        }
        track
    }

    /// Follow the chat log forever, reopening it whenever its stream ends.
    pub async fn run(&self, tailer: TailerConfig) {
        loop {
            let mut lines = pin!(tail(tailer.clone(), self.log.clone()));
            while let Some(line) = lines.next().await {
                let outcome = self.process_line(&line).await;
                tracing::debug!(?outcome, "Request handled");
            }
            self.log.warn(format!(
                "Stopped reading chat log, retrying in {}s",
                RESTART_DELAY.as_secs()
            ));
            sleep(RESTART_DELAY).await;
        }
    }
}
