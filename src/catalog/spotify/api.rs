use anyhow::{bail, Context as _, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_LENGTH, Client, Response, StatusCode};
use tracing::debug;

use crate::catalog::{
    spotify::types::{CurrentlyPlaying, QueueResponse, SearchResponse, SpotifyConfig, Track},
    CatalogService, NowPlaying, QueuedTrack, TrackCandidate,
};

/// Spotify Web API client
pub struct SpotifyClient {
    config: SpotifyConfig,
    client: Client,
}

impl SpotifyClient {
    /// Create new Spotify client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Response> {
        debug!(path, ?params, "Spotify GET");
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.config.access_token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Spotify request {path} failed"))?;
        ensure_success(path, response).await
    }
}

async fn ensure_success(path: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    bail!("Spotify request {path} failed: {status} - {body}")
}

fn artist_names(track: &Track) -> Vec<String> {
    track.artists.iter().map(|a| a.name.clone()).collect()
}

#[async_trait]
impl CatalogService for SpotifyClient {
    async fn currently_playing(&self) -> Result<Option<NowPlaying>> {
        let response = self.get("/v1/me/player/currently-playing", &[]).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let playing: CurrentlyPlaying = response
            .json()
            .await
            .context("Failed to parse currently playing response")?;
        if !playing.is_playing {
            return Ok(None);
        }
        let (Some(item), Some(progress_ms)) = (playing.item, playing.progress_ms) else {
            return Ok(None);
        };
        let Some(duration_ms) = item.duration_ms else {
            return Ok(None);
        };
        let artist = item
            .artists
            .first()
            .map_or_else(|| "Unknown".to_owned(), |a| a.name.clone());
        Ok(Some(NowPlaying {
            track: item.name,
            artist,
            progress_ms,
            duration_ms,
        }))
    }

    async fn search_tracks(&self, query: &str, limit: u8) -> Result<Vec<TrackCandidate>> {
        let limit = limit.to_string();
        let response = self
            .get(
                "/v1/search",
                &[("q", query), ("type", "track"), ("limit", &limit)],
            )
            .await?;
        let search: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;
        Ok(search
            .tracks
            .items
            .into_iter()
            .flatten()
            .map(|t| TrackCandidate {
                name: t.name,
                uri: t.uri,
            })
            .collect())
    }

    async fn queue(&self) -> Result<Vec<QueuedTrack>> {
        let response = self.get("/v1/me/player/queue", &[]).await?;
        let queue: QueueResponse = response
            .json()
            .await
            .context("Failed to parse queue response")?;
        Ok(queue
            .queue
            .into_iter()
            .map(|t| QueuedTrack {
                artists: artist_names(&t),
                uri: t.uri,
                name: t.name,
            })
            .collect())
    }

    async fn add_to_queue(&self, uri: &str) -> Result<()> {
        let path = "/v1/me/player/queue";
        debug!(uri, "Spotify enqueue");
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.config.access_token)
            .query(&[("uri", uri)])
            .header(CONTENT_LENGTH, 0)
            .send()
            .await
            .with_context(|| format!("Spotify request {path} failed"))?;
        ensure_success(path, response).await?;
        Ok(())
    }

    async fn access_token(&self) -> Result<String> {
        Ok(self.config.access_token.clone())
    }
}
