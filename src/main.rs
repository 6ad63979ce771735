use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use songreq::{
    catalog::spotify::SpotifyClient,
    inference::gemini::GeminiClient,
    log_ring::LogRing,
    session::{Session, SessionContext},
};

mod args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = args::Args::parse();
    args.init_tracing_subscriber()?;

    let context = SessionContext {
        catalog: Arc::new(SpotifyClient::new(args.spotify_config())?),
        inference: Arc::new(GeminiClient::new(args.gemini_config())?),
        log: LogRing::new(args.log_capacity),
    };
    let session = Session::start(context, args.session_config());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    session.stop().await;
    Ok(())
}
