//! In-memory stand-ins for the external services.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::{
    catalog::{CatalogService, NowPlaying, QueuedTrack, TrackCandidate},
    inference::InferenceService,
};

#[derive(Default)]
pub struct CatalogState {
    pub now_playing: Option<NowPlaying>,
    pub playback_fails: bool,
    /// Search results keyed by the exact query string
    pub search_results: HashMap<String, Vec<TrackCandidate>>,
    pub search_fails: bool,
    pub queue: Vec<QueuedTrack>,
    pub queue_read_fails: bool,
    pub enqueue_fails: bool,
    pub searches: Vec<String>,
    pub queue_reads: usize,
    pub enqueued: Vec<String>,
}

/// A catalog whose queue grows when tracks are added, like the real one.
#[derive(Default)]
pub struct FakeCatalog(Mutex<CatalogState>);

impl FakeCatalog {
    pub fn state(&self) -> MutexGuard<'_, CatalogState> {
        self.0.lock().unwrap()
    }

    pub fn with_results(self, query: &str, names_and_uris: &[(&str, &str)]) -> Self {
        self.state().search_results.insert(
            query.to_owned(),
            names_and_uris
                .iter()
                .map(|(name, uri)| TrackCandidate {
                    name: (*name).to_owned(),
                    uri: (*uri).to_owned(),
                })
                .collect(),
        );
        self
    }

    pub fn with_queued(self, uri: &str) -> Self {
        self.state().queue.push(queued(uri));
        self
    }
}

pub fn queued(uri: &str) -> QueuedTrack {
    QueuedTrack {
        uri: uri.to_owned(),
        name: format!("name of {uri}"),
        artists: vec!["artist".to_owned()],
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn currently_playing(&self) -> Result<Option<NowPlaying>> {
        let state = self.state();
        if state.playback_fails {
            return Err(anyhow!("playback lookup failed"));
        }
        Ok(state.now_playing.clone())
    }

    async fn search_tracks(&self, query: &str, _limit: u8) -> Result<Vec<TrackCandidate>> {
        let mut state = self.state();
        state.searches.push(query.to_owned());
        if state.search_fails {
            return Err(anyhow!("search failed"));
        }
        Ok(state.search_results.get(query).cloned().unwrap_or_default())
    }

    async fn queue(&self) -> Result<Vec<QueuedTrack>> {
        let mut state = self.state();
        state.queue_reads += 1;
        if state.queue_read_fails {
            return Err(anyhow!("queue read failed"));
        }
        Ok(state.queue.clone())
    }

    async fn add_to_queue(&self, uri: &str) -> Result<()> {
        let mut state = self.state();
        if state.enqueue_fails {
            return Err(anyhow!("enqueue failed"));
        }
        state.enqueued.push(uri.to_owned());
        state.queue.push(queued(uri));
        Ok(())
    }

    async fn access_token(&self) -> Result<String> {
        Ok("fake-token".to_owned())
    }
}

/// Only the troll check asks for a bare yes/no answer.
const TROLL_CHECK_PHRASE: &str = "Reply with 'yes' or 'no'";

/// Answers troll checks and refinements with canned replies; `None` fails the call.
#[derive(Default)]
pub struct FakeInference {
    pub refine_reply: Option<String>,
    pub troll_reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeInference {
    pub fn new(refine_reply: Option<&str>, troll_reply: Option<&str>) -> Self {
        Self {
            refine_reply: refine_reply.map(ToOwned::to_owned),
            troll_reply: troll_reply.map(ToOwned::to_owned),
            prompts: Mutex::default(),
        }
    }
}

#[async_trait]
impl InferenceService for FakeInference {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        let reply = if prompt.contains(TROLL_CHECK_PHRASE) {
            &self.troll_reply
        } else {
            &self.refine_reply
        };
        reply.clone().ok_or_else(|| anyhow!("inference unavailable"))
    }
}
