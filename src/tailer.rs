//! Follow a growing chat log and surface new request lines.
//!
//! Only content appended after the tailer opens the file is read. The byte
//! encoding is guessed from a sample of the file before the first read, and
//! again whenever the file is truncated. The tailer drops to windows-1252 the
//! first time a line fails to decode, so no byte sequence can end the stream.


use std::{collections::VecDeque, io::SeekFrom, path::PathBuf, time::Duration};

use anyhow::{Context as _, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use futures_lite::{stream, Stream};
use tokio::{
    fs::{self, File},
    io::{AsyncReadExt as _, AsyncSeekExt as _},
    time::sleep,
};

use crate::{log_ring::LogRing, request::RequestMarkers};

/// How much of the end of the file is inspected to guess its encoding.
const ENCODING_SAMPLE_LEN: u64 = 64 * 1024;
const READ_CHUNK_LEN: usize = 8 * 1024;
/// Longest run of bytes without a newline kept while waiting for the line to end.
const MAX_PENDING_LEN: usize = 4 * READ_CHUNK_LEN;

#[derive(Debug, Clone)]
pub struct TailerConfig {
    pub path: PathBuf,
    pub markers: RequestMarkers,
    /// Sleep between polls once the end of the file is reached
    pub poll_interval: Duration,
}

/// Guess the encoding of a chat log from a sample of its bytes.
///
/// `at_start` tells whether the sample begins at offset zero, in which case a
/// byte order mark is honoured. Line splitting works on `\n` bytes, so
/// encodings that are not ASCII-compatible are never returned.
#[must_use]
pub fn detect_encoding(sample: &[u8], at_start: bool) -> &'static Encoding {
    if at_start {
        if let Some((encoding, _)) = Encoding::for_bom(sample) {
            if encoding.is_ascii_compatible() {
                return encoding;
            }
            tracing::warn!(encoding = encoding.name(), "Unsupported chat log encoding");
            return UTF_8;
        }
    }
    if sample.is_ascii() {
        return UTF_8;
    }
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(sample, true);
    let guess = detector.guess(None, true);
    if guess.is_ascii_compatible() {
        guess
    } else {
        UTF_8
    }
}

/// The part of an encoding sample that starts on a line boundary.
///
/// A sample taken from the middle of a file may begin inside a multi-byte
/// character, which would make valid UTF-8 look like a legacy encoding.
#[must_use]
pub fn align_sample(sample: &[u8], at_start: bool) -> &[u8] {
    if at_start {
        return sample;
    }
    match sample.iter().position(|&b| b == b'\n') {
        Some(newline) => &sample[newline + 1..],
        None => {
            let skip = sample
                .iter()
                .take_while(|&&b| b & 0b1100_0000 == 0b1000_0000)
                .count();
            &sample[skip..]
        }
    }
}

/// Read the tail of `file` and guess its encoding. Leaves the cursor at an arbitrary position.
async fn sniff_encoding(file: &mut File, len: u64) -> Result<&'static Encoding> {
    let sample_start = len.saturating_sub(ENCODING_SAMPLE_LEN);
    file.seek(SeekFrom::Start(sample_start)).await?;
    let mut sample = Vec::new();
    file.take(ENCODING_SAMPLE_LEN).read_to_end(&mut sample).await?;
    let at_start = sample_start == 0;
    Ok(detect_encoding(align_sample(&sample, at_start), at_start))
}

pub struct LogTailer {
    config: TailerConfig,
    file: File,
    /// Bytes consumed from `file` so far
    offset: u64,
    /// Bytes read past the last complete line
    pending: Vec<u8>,
    /// Inside an overlong line whose remainder is skipped
    discarding: bool,
    /// Matching lines decoded but not yet handed out
    ready: VecDeque<String>,
    encoding: &'static Encoding,
    log: LogRing,
}

impl LogTailer {
    /// Open the chat log, guess its encoding and seek to its end.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, inspected or seeked.
    pub async fn open(config: TailerConfig, log: LogRing) -> Result<Self> {
        let path = config.path.display().to_string();
        let mut file = File::open(&config.path)
            .await
            .with_context(|| format!("Failed to open chat log {path}"))?;
        let len = file
            .metadata()
            .await
            .with_context(|| format!("Failed to stat chat log {path}"))?
            .len();

        let encoding = sniff_encoding(&mut file, len)
            .await
            .with_context(|| format!("Failed to sample chat log {path}"))?;
        log.info(format!("Detected encoding: {}", encoding.name()));

        let offset = file.seek(SeekFrom::End(0)).await?;
        log.info(format!("Opened chat log {path} and moved to the end"));

        Ok(Self {
            config,
            file,
            offset,
            pending: Vec::new(),
            discarding: false,
            ready: VecDeque::new(),
            encoding,
            log,
        })
    }

    #[must_use]
    pub const fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Wait for the next appended line carrying both request markers.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from or reopening the file fails.
    pub async fn next_line(&mut self) -> Result<String> {
        let mut chunk = [0; READ_CHUNK_LEN];
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(line);
            }
            let read = self
                .file
                .read(&mut chunk)
                .await
                .context("Failed to read chat log")?;
            if read == 0 {
                self.reopen_if_shrunk().await?;
                sleep(self.config.poll_interval).await;
                continue;
            }
            self.offset += read as u64;
            self.pending.extend_from_slice(&chunk[..read]);
            self.drain_lines();
            if self.pending.len() > MAX_PENDING_LEN {
                if !self.discarding {
                    self.log.warn(format!(
                        "Chat log line exceeds {MAX_PENDING_LEN} bytes, skipping it"
                    ));
                }
                self.pending.clear();
                self.discarding = true;
            }
        }
    }

    /// Start over from the beginning if the file was truncated or replaced by a shorter one.
    async fn reopen_if_shrunk(&mut self) -> Result<()> {
        let len = match fs::metadata(&self.config.path).await {
            Ok(m) => m.len(),
            Err(e) => {
                tracing::debug!(?e, "Chat log is temporarily unavailable");
                return Ok(());
            }
        };
        if len >= self.offset {
            return Ok(());
        }
        self.log.warn(format!(
            "Chat log shrank from {} to {len} bytes, reading it from the start",
            self.offset
        ));
        let path = self.config.path.display().to_string();
        let mut file = File::open(&self.config.path)
            .await
            .with_context(|| format!("Failed to reopen chat log {path}"))?;
        let encoding = sniff_encoding(&mut file, len)
            .await
            .with_context(|| format!("Failed to sample chat log {path}"))?;
        if encoding != self.encoding {
            self.log.info(format!("Detected encoding: {}", encoding.name()));
        }
        file.seek(SeekFrom::Start(0)).await?;

        self.file = file;
        self.encoding = encoding;
        self.offset = 0;
        self.pending.clear();
        self.discarding = false;
        Ok(())
    }

    fn drain_lines(&mut self) {
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let line = self.decode(&raw[..end]);
            let line = line.trim();
            if self.config.markers.matches(line) {
                self.log.info(format!("Detected request line: {line}"));
                self.ready.push_back(line.to_owned());
            }
        }
    }

    fn decode(&mut self, bytes: &[u8]) -> String {
        if let Some(text) = self
            .encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
        {
            return text.into_owned();
        }
        self.log.warn(format!(
            "Chat log is not valid {}, switching to {}",
            self.encoding.name(),
            WINDOWS_1252.name()
        ));
        self.encoding = WINDOWS_1252;
        WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
    }
}

enum TailState {
    Closed(TailerConfig, LogRing),
    Open(LogTailer),
}

/// Lazily open the chat log and stream request lines appended to it.
///
/// The stream ends, after logging the cause, when the file cannot be opened
/// or read. Dropping the stream closes the file.
pub fn tail(config: TailerConfig, log: LogRing) -> impl Stream<Item = String> + Send {
    stream::unfold(TailState::Closed(config, log), |state| async move {
        let mut tailer = match state {
            TailState::Open(tailer) => tailer,
            TailState::Closed(config, log) => match LogTailer::open(config, log.clone()).await {
                Ok(tailer) => tailer,
                Err(e) => {
                    log.error(format!("Error opening chat log: {e:#}"));
                    return None;
                }
            },
        };
        match tailer.next_line().await {
            Ok(line) => Some((line, TailState::Open(tailer))),
            Err(e) => {
                tailer.log.error(format!("Error reading chat log: {e:#}"));
                None
            }
        }
    })
}
