//! Mirror the currently playing track into a one-line overlay file.


use std::{path::PathBuf, sync::Arc, time::Duration};

use tokio::{fs, time::sleep};

use crate::{
    catalog::{CatalogService, NowPlaying},
    log_ring::LogRing,
};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub status_file: PathBuf,
    /// Poll interval while something is playing
    pub playing_interval: Duration,
    /// Poll interval while idle or after an error
    pub idle_interval: Duration,
}

/// Whole minutes left, as shown in the overlay.
#[must_use]
pub const fn remaining_minutes(remaining: Duration) -> u64 {
    remaining.as_secs() / 60
}

#[must_use]
pub fn format_remaining(remaining: Duration) -> String {
    format!("{} min", remaining_minutes(remaining))
}

/// The overlay line, with the overlay's literal color placeholders.
#[must_use]
pub fn status_line(now: &NowPlaying) -> String {
    format!(
        "{{FFFFFF}}[{}] {{4187a3}}{} {{E65C00}}- {{4187a3}}{}{{E65C00}}",
        format_remaining(now.remaining()),
        now.track,
        now.artist
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollerState {
    /// Nothing written yet
    Starting,
    Playing { minute: u64 },
    Idle,
}

/// What a single poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// The status file now holds this line
    Updated(String),
    /// Still in the same displayed minute
    Unchanged,
    /// Playback stopped and the status file was emptied
    Blanked,
    /// Still idle
    Idle,
    /// The status file could not be written and will be retried
    WriteFailed,
}

pub struct StatusPoller {
    catalog: Arc<dyn CatalogService>,
    config: PollerConfig,
    state: PollerState,
    log: LogRing,
}

impl StatusPoller {
    pub fn new(catalog: Arc<dyn CatalogService>, config: PollerConfig, log: LogRing) -> Self {
        Self {
            catalog,
            config,
            state: PollerState::Starting,
            log,
        }
    }

    /// Poll playback once and return what happened and how long to wait before the next poll.
    pub async fn tick(&mut self) -> (Tick, Duration) {
        let now_playing = match self.catalog.currently_playing().await {
            Ok(now) => now,
            Err(e) => {
                self.log
                    .error(format!("Spotify API error while polling playback: {e:#}"));
                None
            }
        };
        match now_playing {
            Some(now) => (self.show(&now).await, self.config.playing_interval),
            None => (self.blank().await, self.config.idle_interval),
        }
    }

    async fn show(&mut self, now: &NowPlaying) -> Tick {
        let minute = remaining_minutes(now.remaining());
        if self.state == (PollerState::Playing { minute }) {
            return Tick::Unchanged;
        }
        let line = status_line(now);
        if let Err(e) = fs::write(&self.config.status_file, &line).await {
            self.log.error(format!(
                "Error writing status file {}: {e}",
                self.config.status_file.display()
            ));
            return Tick::WriteFailed;
        }
        self.state = PollerState::Playing { minute };
        self.log.info(format!("Updated status: {line}"));
        Tick::Updated(line)
    }

    async fn blank(&mut self) -> Tick {
        if self.state == PollerState::Idle {
            return Tick::Idle;
        }
        if let Err(e) = fs::write(&self.config.status_file, "").await {
            self.log.error(format!(
                "Error clearing status file {}: {e}",
                self.config.status_file.display()
            ));
            return Tick::WriteFailed;
        }
        self.state = PollerState::Idle;
        self.log.info("No song is currently playing.");
        Tick::Blanked
    }

    /// Poll forever.
    pub async fn run(mut self) {
        loop {
            let (tick, wait) = self.tick().await;
            tracing::trace!(?tick, ?wait, "Status poll");
            sleep(wait).await;
        }
    }
}
