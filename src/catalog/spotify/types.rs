use std::time::Duration;

use serde::Deserialize;

/// Configuration for the Spotify Web API connection
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub base_url: String,
    /// Bearer token of an already-authorised user session
    pub access_token: String,
    pub timeout: Duration,
}

/// Response of `GET /v1/me/player/currently-playing`
#[derive(Debug, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,
    pub progress_ms: Option<u64>,
    pub item: Option<Track>,
}

#[derive(Debug, Deserialize)]
pub struct Track {
    pub name: String,
    pub uri: String,
    /// Absent for podcast episodes
    #[serde(default)]
    pub artists: Vec<Artist>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Artist {
    pub name: String,
}

/// Response of `GET /v1/search`
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    /// The API occasionally returns `null` entries
    pub items: Vec<Option<Track>>,
}

/// Response of `GET /v1/me/player/queue`
#[derive(Debug, Deserialize)]
pub struct QueueResponse {
    #[serde(default)]
    pub queue: Vec<Track>,
}
