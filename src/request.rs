//! Song requests as they appear in the chat log.


use std::fmt;

use anyhow::{anyhow, ensure, Result};

/// Separator between the song and the optional artist in a request.
const ARTIST_DELIMITER: &str = " - ";

/// The two literal tokens a chat line must carry to count as a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMarkers {
    pub source: String,
    pub request: String,
}

impl Default for RequestMarkers {
    fn default() -> Self {
        Self {
            source: "[VOV]".to_owned(),
            request: "[Request]".to_owned(),
        }
    }
}

impl RequestMarkers {
    #[must_use]
    pub fn matches(&self, line: &str) -> bool {
        line.contains(&self.source) && line.contains(&self.request)
    }

    /// Extract a [`SongRequest`] from a line already known to carry both markers.
    ///
    /// # Errors
    ///
    /// Returns an error if the request marker is missing or the song part is empty.
    pub fn parse(&self, line: &str) -> Result<SongRequest> {
        let payload = line
            .split(self.request.as_str())
            .nth(1)
            .ok_or_else(|| anyhow!("Line has no {} marker: {line}", self.request))?
            .trim();
        let (song, artist) = match payload.split_once(ARTIST_DELIMITER) {
            Some((song, artist)) => (song, Some(artist)),
            None => (payload, None),
        };
        SongRequest::new(song, artist)
    }
}

/// A song name with an optional artist.
///
/// Each pipeline stage produces a fresh value instead of editing one in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRequest {
    pub song: String,
    pub artist: Option<String>,
}

impl SongRequest {
    /// Build a request from untrimmed parts. A blank artist counts as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the song name is blank.
    pub fn new(song: &str, artist: Option<&str>) -> Result<Self> {
        let song = song.trim();
        ensure!(!song.is_empty(), "Song request has an empty song name");
        let artist = artist
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(ToOwned::to_owned);
        Ok(Self {
            song: song.to_owned(),
            artist,
        })
    }

    #[must_use]
    pub fn artist_or_unknown(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown")
    }
}

impl fmt::Display for SongRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.song, self.artist_or_unknown())
    }
}
