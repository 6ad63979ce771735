//! Best-effort cleanup and screening of song requests with a language model.
//!
//! Both operations degrade to a safe answer when the model misbehaves: the
//! unrefined request, or "not a troll".


use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::Deserialize;

use crate::{inference::InferenceService, log_ring::LogRing, request::SongRequest};

/// The JSON object the model is asked to reply with
#[derive(Debug, Deserialize)]
struct Refinement {
    song: Option<String>,
    artist: Option<String>,
}

fn refine_prompt(request: &SongRequest) -> String {
    format!(
        "Fix this song request so it can be found on Spotify.\n\n\
         User input: '{}' by '{}'.\n\
         - Correct typos and unclear names.\n\
         - If the song name looks like nonsense, guess the closest real song.\n\
         - If no artist is given, use the most likely popular one.\n\
         - If an artist is given, use that artist's version rather than the most popular one.\n\
         - Use correct spelling and formatting.\n\
         Return ONLY JSON like this: {{\"song\": \"fixed name\", \"artist\": \"correct artist\"}}",
        request.song,
        request.artist_or_unknown()
    )
}

fn troll_prompt(request: &SongRequest) -> String {
    format!(
        "Is the song '{}' by '{}' considered a troll or unserious song? \
         Reply with 'yes' or 'no'. An example of a troll song is baby shark.",
        request.song,
        request.artist_or_unknown()
    )
}

/// Peel code fences and surrounding prose off a reply expected to hold a JSON object.
#[must_use]
pub fn extract_json(reply: &str) -> &str {
    let reply = reply.trim();
    let reply = reply
        .strip_prefix("```json")
        .or_else(|| reply.strip_prefix("```"))
        .unwrap_or(reply);
    let reply = reply.strip_suffix("```").unwrap_or(reply).trim();
    match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if start < end => &reply[start..=end],
        _ => reply,
    }
}

/// Byte range of the first case-insensitive occurrence of `needle` in `haystack`.
fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    haystack.char_indices().find_map(|(start, _)| {
        let mut rest = haystack[start..].char_indices();
        let mut end = start;
        for n in needle.chars() {
            let (offset, h) = rest.next()?;
            if !h.to_lowercase().eq(n.to_lowercase()) {
                return None;
            }
            end = start + offset + h.len_utf8();
        }
        Some((start, end))
    })
}

/// Remove every occurrence of `artist` from `song` along with the separators left dangling.
///
/// The song is kept unchanged if nothing would be left of it.
#[must_use]
pub fn strip_artist(song: &str, artist: &str) -> String {
    let mut stripped = song.to_owned();
    while let Some((start, end)) = find_ignore_case(&stripped, artist) {
        stripped.replace_range(start..end, "");
    }
    let stripped = stripped.trim_matches(|c| c == ' ' || c == '-');
    if stripped.is_empty() {
        song.to_owned()
    } else {
        stripped.to_owned()
    }
}

/// Interpret a refinement reply, keeping the original value for any field the model left out.
///
/// # Errors
///
/// Returns an error if the reply holds no JSON object of the expected shape.
pub fn parse_refinement(reply: &str, original: &SongRequest) -> Result<SongRequest> {
    let json = extract_json(reply);
    let refinement: Refinement = serde_json::from_str(json)
        .with_context(|| format!("Model returned invalid JSON: {json}"))?;

    let song = refinement
        .song
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(original.song.as_str());
    let artist = refinement
        .artist
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .or(original.artist.as_deref());
    let song = match artist {
        Some(artist) => strip_artist(song, artist),
        None => song.to_owned(),
    };
    SongRequest::new(&song, artist)
}

pub struct RequestRefiner {
    inference: Arc<dyn InferenceService>,
    log: LogRing,
}

impl RequestRefiner {
    pub fn new(inference: Arc<dyn InferenceService>, log: LogRing) -> Self {
        Self { inference, log }
    }

    /// Correct and complete a request, or return it unchanged if the model cannot help.
    pub async fn refine(&self, request: &SongRequest) -> SongRequest {
        match self.try_refine(request).await {
            Ok(refined) => {
                self.log.info(format!("Refined song request: {refined}"));
                refined
            }
            Err(e) => {
                self.log
                    .warn(format!("Error refining song request, using original: {e:#}"));
                request.clone()
            }
        }
    }

    async fn try_refine(&self, request: &SongRequest) -> Result<SongRequest> {
        let reply = self
            .inference
            .generate(&refine_prompt(request))
            .await
            .context("Refinement call failed")?;
        parse_refinement(&reply, request)
    }

    /// Whether the model flags the request as a joke. Failures count as "no".
    pub async fn is_troll(&self, request: &SongRequest) -> bool {
        match self.inference.generate(&troll_prompt(request)).await {
            Ok(reply) => reply.trim().to_lowercase() == "yes",
            Err(e) => {
                self.log
                    .warn(format!("Error checking for troll song: {e:#}"));
                false
            }
        }
    }
}
