//! Subtitle download orchestration.
//! Wraps lookup, selection and download in a bounded retry loop and falls
//! back to asking the user when the subtitle service keeps failing.

use crate::cache::CacheStore;
use crate::config::Config;
use crate::lookup::{SubtitleLookup, SubtitleRecord, SubtitleService};
use crate::prompt::Prompt;
use crate::select;
use crate::show::Show;
use anyhow::Result;
use async_compression::tokio::bufread::GzipDecoder;
use futures::TryStreamExt;
use reqwest::Client;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::io::StreamReader;
use tracing::{debug, info, trace, warn};

/// Lookup-and-download cycles tried before giving up on the service.
pub const MAX_ATTEMPTS: u32 = 5;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// How the subtitle question was settled for a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleOutcome {
    /// A subtitle from an earlier run was reused.
    Reused(PathBuf),
    Downloaded(PathBuf),
    /// Offline, declined, or nothing picked from the list.
    Skipped,
    /// The service answered but had no subtitles for the show.
    NotFound,
    /// The service kept failing and the user chose to go on without.
    ContinueWithout,
}

impl SubtitleOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Reused(path) | Self::Downloaded(path) => Some(path),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// The user refused to continue once the service gave up.
    #[error("subtitles unavailable and the user chose not to continue")]
    Aborted,
    #[error("prompt failed: {0:#}")]
    Prompt(anyhow::Error),
}

/// Why a single attempt did not produce a subtitle.
enum AttemptError {
    /// Network, service or disk trouble; worth another attempt.
    Transient(anyhow::Error),
    Prompt(anyhow::Error),
}

/// Fetches the subtitle for a show, reusing earlier downloads and cached
/// search results where it can.
pub struct SubtitleFetcher<S, P> {
    cache: CacheStore,
    lookup: SubtitleLookup<S>,
    prompt: P,
    http: Client,
    language: Option<String>,
    offline: bool,
}

impl<S: SubtitleService, P: Prompt> SubtitleFetcher<S, P> {
    pub fn new(config: &Config, service: S, prompt: P, http: Client) -> Self {
        Self {
            cache: CacheStore::new(config),
            lookup: SubtitleLookup::new(service),
            prompt,
            http,
            language: config.language.clone(),
            offline: config.offline,
        }
    }

    /// Settle the subtitle for `show`.
    /// Only [`FetchError::Aborted`] and prompt failures escape; service and
    /// download errors are retried and end in the degraded question.
    pub async fn fetch(&self, show: &Show) -> Result<SubtitleOutcome, FetchError> {
        let dest = self.cache.subtitle_path(&show.title);
        trace!("fetch title={} dest={}", show.title, dest.display());

        if is_readable(&dest)
            && self.confirm("Found previously downloaded subtitles, continue with it?", true)?
        {
            return Ok(SubtitleOutcome::Reused(dest));
        }

        if self.offline {
            info!("subtitles download disabled in offline mode");
            return Ok(SubtitleOutcome::Skipped);
        }
        if !self.confirm("Download subtitles?", true)? {
            return Ok(SubtitleOutcome::Skipped);
        }

        for attempt in 1..=MAX_ATTEMPTS {
            info!(attempt, "searching subtitles...");
            match self.attempt(show, &dest).await {
                Ok(outcome) => return Ok(outcome),
                Err(AttemptError::Prompt(err)) => return Err(FetchError::Prompt(err)),
                Err(AttemptError::Transient(err)) => {
                    warn!(attempt, "failed looking up subtitles: {err:#}");
                }
            }
        }

        warn!("subtitle service seems to be grumpy today, giving up after {MAX_ATTEMPTS} attempts");
        if self.confirm("Continue without subtitles?", true)? {
            Ok(SubtitleOutcome::ContinueWithout)
        } else {
            Err(FetchError::Aborted)
        }
    }

    /// One search, select and download cycle.
    async fn attempt(&self, show: &Show, dest: &Path) -> Result<SubtitleOutcome, AttemptError> {
        let records = self
            .search(&show.title)
            .await
            .map_err(AttemptError::Transient)?;
        if records.is_empty() {
            info!("no subtitles found");
            return Ok(SubtitleOutcome::NotFound);
        }
        let picked = select::select(&records, self.language.as_deref(), &self.prompt)
            .map_err(AttemptError::Prompt)?;
        let Some(record) = picked else {
            return Ok(SubtitleOutcome::Skipped);
        };
        download(&self.http, &record.download_url, dest)
            .await
            .map_err(AttemptError::Transient)?;
        Ok(SubtitleOutcome::Downloaded(dest.to_path_buf()))
    }

    /// Cached results when fresh, otherwise a remote search stored back
    /// into the cache.
    async fn search(&self, title: &str) -> Result<Vec<SubtitleRecord>> {
        if let Some(records) = self.cache.get(title) {
            debug!("using {} cached results", records.len());
            return Ok(records);
        }
        let records = self.lookup.search(title).await?;
        self.cache.put(title, &records);
        Ok(records)
    }

    fn confirm(&self, message: &str, default: bool) -> Result<bool, FetchError> {
        self.prompt
            .confirm(message, default)
            .map_err(FetchError::Prompt)
    }
}

fn is_readable(path: &Path) -> bool {
    std::fs::File::open(path).is_ok()
}

/// Stream `url` into `dest`, gunzipping on the fly when the payload is
/// gzip and copying it unchanged otherwise. A failed transfer leaves no
/// file behind.
pub async fn download(client: &Client, url: &str, dest: &Path) -> Result<PathBuf> {
    info!("download: {url}");
    info!("to: {}", dest.display());
    match stream_to_file(client, url, dest).await {
        Ok(bytes) => {
            debug!("wrote {bytes} bytes to {}", dest.display());
            Ok(dest.to_path_buf())
        }
        Err(err) => {
            let _ = tokio::fs::remove_file(dest).await;
            Err(err)
        }
    }
}

async fn stream_to_file(client: &Client, url: &str, dest: &Path) -> Result<u64> {
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.bytes_stream().map_err(io::Error::other);
    let mut reader = BufReader::new(StreamReader::new(Box::pin(body)));
    let gzipped = reader.fill_buf().await?.starts_with(&GZIP_MAGIC);

    let mut file = File::create(dest).await?;
    let written = if gzipped {
        let mut decoder = GzipDecoder::new(reader);
        decoder.multiple_members(true);
        tokio::io::copy(&mut decoder, &mut file).await?
    } else {
        tokio::io::copy(&mut reader, &mut file).await?
    };
    file.flush().await?;
    Ok(written)
}
