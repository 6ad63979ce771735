//! Turn a song request into a playable catalog track.

use std::sync::Arc;

use crate::{
    catalog::{CatalogService, TrackCandidate},
    log_ring::LogRing,
    request::SongRequest,
};

/// Maximum number of search hits considered per request.
pub const SEARCH_LIMIT: u8 = 10;

/// A catalog track picked for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub uri: String,
}

/// Structured search query; the artist is only constrained when known.
#[must_use]
pub fn search_query(request: &SongRequest) -> String {
    match &request.artist {
        Some(artist) => format!("track:{} artist:{artist}", request.song),
        None => format!("track:{}", request.song),
    }
}

/// Prefer the first hit that is not a remaster, otherwise take the first hit.
#[must_use]
pub fn pick_track(candidates: &[TrackCandidate]) -> Option<&TrackCandidate> {
    candidates
        .iter()
        .find(|c| !c.name.to_lowercase().contains("remaster"))
        .or_else(|| candidates.first())
}

pub struct TrackResolver {
    catalog: Arc<dyn CatalogService>,
    log: LogRing,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn CatalogService>, log: LogRing) -> Self {
        Self { catalog, log }
    }

    /// Search the catalog for `request`. Search failures count as "not found".
    pub async fn resolve(&self, request: &SongRequest) -> Option<ResolvedTrack> {
        let query = search_query(request);
        let candidates = match self.catalog.search_tracks(&query, SEARCH_LIMIT).await {
            Ok(c) => c,
            Err(e) => {
                self.log
                    .error(format!("Error searching for song on Spotify: {e:#}"));
                return None;
            }
        };
        let track = pick_track(&candidates)?;
        tracing::debug!(%query, name = %track.name, uri = %track.uri, "Resolved request");
        Some(ResolvedTrack {
            uri: track.uri.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::test_support::FakeCatalog;

    fn candidate(name: &str, uri: &str) -> TrackCandidate {
        TrackCandidate {
            name: name.to_owned(),
            uri: uri.to_owned(),
        }
    }

    #[test]
    fn query_shape() {
        let request = SongRequest::new("Numb", Some("Linkin Park")).unwrap();
        assert_eq!(search_query(&request), "track:Numb artist:Linkin Park");
        let request = SongRequest::new("Numb", None).unwrap();
        assert_eq!(search_query(&request), "track:Numb");
    }

    #[test]
    fn remaster_tie_break() {
        let remaster = candidate("Song (Remaster)", "spotify:track:remaster");
        let plain = candidate("Song", "spotify:track:plain");

        let hits = [remaster.clone(), plain.clone()];
        assert_eq!(pick_track(&hits), Some(&plain));
        let hits = [plain.clone(), remaster.clone()];
        assert_eq!(pick_track(&hits), Some(&plain));

        let all_remastered = [
            candidate("Song - 2011 REMASTERED", "spotify:track:first"),
            remaster,
        ];
        assert_eq!(pick_track(&all_remastered).unwrap().uri, "spotify:track:first");

        assert_eq!(pick_track(&[]), None);
    }

    #[tokio::test]
    async fn resolve_searches_with_artist() {
        let catalog = Arc::new(FakeCatalog::default().with_results(
            "track:Yesterday artist:The Beatles",
            &[
                ("Yesterday - Remastered 2009", "spotify:track:r"),
                ("Yesterday", "spotify:track:y"),
            ],
        ));
        let resolver = TrackResolver::new(catalog.clone(), LogRing::new(8));

        let request = SongRequest::new("Yesterday", Some("The Beatles")).unwrap();
        assert_eq!(
            resolver.resolve(&request).await,
            Some(ResolvedTrack {
                uri: "spotify:track:y".to_owned()
            })
        );
        let request = SongRequest::new("Yesterday", None).unwrap();
        assert_eq!(resolver.resolve(&request).await, None);
        assert_eq!(catalog.state().searches.len(), 2);
    }

    #[tokio::test]
    async fn search_failure_is_not_found() {
        let catalog = Arc::new(FakeCatalog::default());
        catalog.state().search_fails = true;
        let log = LogRing::new(8);
        let resolver = TrackResolver::new(catalog, log.clone());

        let request = SongRequest::new("Yesterday", None).unwrap();
        assert_eq!(resolver.resolve(&request).await, None);
        assert!(log.recent(1)[0].starts_with("Error searching"));
    }
}
