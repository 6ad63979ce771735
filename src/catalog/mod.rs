//! The music catalog and playback service the pipeline talks to.

pub mod spotify;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// The track a player is currently playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub track: String,
    pub artist: String,
    pub progress_ms: u64,
    pub duration_ms: u64,
}

impl NowPlaying {
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        Duration::from_millis(self.duration_ms.saturating_sub(self.progress_ms))
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCandidate {
    pub name: String,
    pub uri: String,
}

/// An entry of the live playback queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedTrack {
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
}

/// Operations consumed from an already-authorised catalog session.
///
/// Implementations must be usable concurrently from both session loops.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// `None` when nothing is playing.
    async fn currently_playing(&self) -> Result<Option<NowPlaying>>;

    /// Search tracks with a structured query such as `track:x artist:y`.
    async fn search_tracks(&self, query: &str, limit: u8) -> Result<Vec<TrackCandidate>>;

    /// A fresh snapshot of the playback queue.
    async fn queue(&self) -> Result<Vec<QueuedTrack>>;

    async fn add_to_queue(&self, uri: &str) -> Result<()>;

    async fn access_token(&self) -> Result<String>;
}
