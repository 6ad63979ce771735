use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use songreq::{
    catalog::spotify::SpotifyConfig,
    inference::gemini::GeminiConfig,
    request::RequestMarkers,
    session::SessionConfig,
    status::PollerConfig,
    tailer::TailerConfig,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Chat log to watch for song requests
    #[clap(long, env = "SONGREQ_CHATLOG")]
    pub chatlog: PathBuf,
    /// File the currently playing track is written to, for stream overlays
    #[clap(long, default_value = "song-name.log")]
    pub status_file: PathBuf,
    /// Token identifying the chat source requests are accepted from
    #[clap(long, default_value = "[VOV]")]
    pub source_marker: String,
    /// Token preceding the requested song
    #[clap(long, default_value = "[Request]")]
    pub request_marker: String,
    /// Gemini API key used to refine and screen requests
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: String,
    #[clap(long, default_value = "gemini-2.0-flash")]
    pub gemini_model: String,
    #[clap(long, default_value = "https://generativelanguage.googleapis.com")]
    pub gemini_base_url: String,
    /// Access token of an authorised Spotify session
    #[clap(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub spotify_access_token: String,
    #[clap(long, default_value = "https://api.spotify.com")]
    pub spotify_base_url: String,
    /// Seconds between playback polls while a song is playing
    #[clap(long, default_value_t = 1.0)]
    pub playing_interval: f64,
    /// Seconds between playback polls while nothing is playing
    #[clap(long, default_value_t = 5.0)]
    pub idle_interval: f64,
    /// Milliseconds to wait for new chat log lines before polling again
    #[clap(long, default_value_t = 100)]
    pub tail_poll_ms: u64,
    /// Number of log lines kept in memory for display
    #[clap(long, default_value_t = 256)]
    pub log_capacity: usize,
    /// Timeout in seconds for requests to Spotify and Gemini
    #[clap(long, default_value_t = 20.0)]
    pub request_timeout: f64,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn init_tracing_subscriber(&self) -> Result<()> {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => builder
                .with_writer(Mutex::new(
                    File::create(f)
                        .with_context(|| format!("Failed to create log file {}", f.display()))?,
                ))
                .init(),
        }
        Ok(())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }

    pub fn spotify_config(&self) -> SpotifyConfig {
        SpotifyConfig {
            base_url: self.spotify_base_url.clone(),
            access_token: self.spotify_access_token.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            base_url: self.gemini_base_url.clone(),
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            tailer: TailerConfig {
                path: self.chatlog.clone(),
                markers: RequestMarkers {
                    source: self.source_marker.clone(),
                    request: self.request_marker.clone(),
                },
                poll_interval: Duration::from_millis(self.tail_poll_ms),
            },
            poller: PollerConfig {
                status_file: self.status_file.clone(),
                playing_interval: Duration::from_secs_f64(self.playing_interval),
                idle_interval: Duration::from_secs_f64(self.idle_interval),
            },
        }
    }
}
