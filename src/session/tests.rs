use std::{fs::OpenOptions, io::Write as _, path::Path, sync::Arc, time::Duration};

use tokio::time::{sleep, timeout};

use super::*;
use crate::{
    catalog::NowPlaying,
    request::RequestMarkers,
    test_support::{FakeCatalog, FakeInference},
};

const SHAPE_OF_YOU: &str = "spotify:track:7qiZfU4dY1lWllzX7mPBI3";

fn append(path: &Path, bytes: &[u8]) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(bytes).unwrap();
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn session_runs_both_loops() {
    let dir = tempfile::tempdir().unwrap();
    let chatlog = dir.path().join("chatlog.txt");
    let status_file = dir.path().join("song-name.log");
    std::fs::write(&chatlog, "[VOV][Request] old request - ignored\n").unwrap();

    let catalog = Arc::new(FakeCatalog::default().with_results(
        "track:Shape of You artist:Ed Sheeran",
        &[("Shape of You", SHAPE_OF_YOU)],
    ));
    catalog.state().now_playing = Some(NowPlaying {
        track: "Numb".to_owned(),
        artist: "Linkin Park".to_owned(),
        progress_ms: 0,
        duration_ms: 185_000,
    });
    let context = SessionContext {
        catalog: catalog.clone(),
        inference: Arc::new(FakeInference::new(
            Some("{\"song\": \"Shape of You\", \"artist\": \"Ed Sheeran\"}"),
            Some("no"),
        )),
        log: LogRing::new(64),
    };
    let config = SessionConfig {
        tailer: TailerConfig {
            path: chatlog.clone(),
            markers: RequestMarkers::default(),
            poll_interval: Duration::from_millis(10),
        },
        poller: PollerConfig {
            status_file: status_file.clone(),
            playing_interval: Duration::from_millis(20),
            idle_interval: Duration::from_millis(50),
        },
    };
    let session = Session::start(context, config);

    wait_until(|| {
        std::fs::read_to_string(&status_file)
            .is_ok_and(|s| s == "{FFFFFF}[3 min] {4187a3}Numb {E65C00}- {4187a3}Linkin Park{E65C00}")
    })
    .await;

    // The tailer opens lazily; wait until it has seeked to the end
    wait_until(|| {
        session
            .recent_logs()
            .iter()
            .any(|l| l.starts_with("Opened chat log"))
    })
    .await;
    append(&chatlog, b"[VOV] viewer: [Request] shape of you - ed sheeran\n");
    wait_until(|| !catalog.state().enqueued.is_empty()).await;

    assert_eq!(catalog.state().enqueued, vec![SHAPE_OF_YOU]);
    assert_eq!(session.current_queue().await[0].uri, SHAPE_OF_YOU);
    assert_eq!(session.access_token().await, "fake-token");
    assert!(session
        .recent_logs()
        .iter()
        .any(|l| l == &format!("Added to queue: {SHAPE_OF_YOU}")));

    catalog.state().now_playing = None;
    wait_until(|| std::fs::read_to_string(&status_file).is_ok_and(|s| s.is_empty())).await;

    session.stop().await;
    // Nothing is picked up once stopped
    append(&chatlog, b"[VOV][Request] Numb - Linkin Park\n");
    sleep(Duration::from_millis(100)).await;
    assert_eq!(catalog.state().enqueued.len(), 1);
}

#[tokio::test]
async fn missing_chatlog_does_not_stop_status_loop() {
    let dir = tempfile::tempdir().unwrap();
    let status_file = dir.path().join("song-name.log");
    let log = LogRing::new(64);
    let context = SessionContext {
        catalog: Arc::new(FakeCatalog::default()),
        inference: Arc::new(FakeInference::default()),
        log: log.clone(),
    };
    let config = SessionConfig {
        tailer: TailerConfig {
            path: dir.path().join("does-not-exist.txt"),
            markers: RequestMarkers::default(),
            poll_interval: Duration::from_millis(10),
        },
        poller: PollerConfig {
            status_file: status_file.clone(),
            playing_interval: Duration::from_millis(20),
            idle_interval: Duration::from_millis(20),
        },
    };
    let session = Session::start(context, config);

    wait_until(|| {
        log.recent(64)
            .iter()
            .any(|l| l.starts_with("Error opening chat log"))
    })
    .await;
    wait_until(|| status_file.exists()).await;
    session.stop().await;
    assert_eq!(log.recent(1), vec!["Session stopped"]);
}
