//! Subtitle lookup against the remote service.
//! This module turns a noisy release title into search queries and runs
//! them inside a single authenticated session.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

pub mod http;

/// Matches `S01E02` and `1x02` style episode markers.
static EPISODE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bs(\d{1,2})\s?e(\d{1,3})\b|\b(\d{1,2})x(\d{2,3})\b")
        .expect("episode marker pattern should be valid")
});

/// Release tags that never belong to the show name.
static RELEASE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:480p|576p|720p|1080[pi]|2160p|4k|uhd|x\.?26[45]|h\.?26[45]|hevc|xvid|divx|10bit|hdtv|pdtv|web-?dl|web-?rip|bluray|bdrip|brrip|dvdrip|hdrip|aac|ac3|ddp?5\.1|proper|repack|internal)\b",
    )
    .expect("release noise pattern should be valid")
});

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket pattern should be valid"));

/// One subtitle file offered by the lookup service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// ISO 639-2 language code, e.g. `eng`.
    #[serde(rename = "SubLanguageID")]
    pub language_id: String,
    #[serde(rename = "SubAddDate", with = "added_date")]
    pub added_date: NaiveDateTime,
    #[serde(rename = "SubFileName")]
    pub file_name: String,
    #[serde(rename = "SubSize", deserialize_with = "size_from_any")]
    pub size_bytes: u64,
    #[serde(rename = "SubDownloadLink")]
    pub download_url: String,
}

/// The remote subtitle service as seen by the lookup client.
#[async_trait]
pub trait SubtitleService: Send + Sync {
    /// Open a session and return its token.
    async fn login(&self) -> Result<String>;

    /// Search for `query`, optionally restricted to one language.
    async fn search_for_title(
        &self,
        token: &str,
        language: Option<&str>,
        query: &str,
    ) -> Result<Vec<SubtitleRecord>>;

    /// Release the session opened by [`SubtitleService::login`].
    async fn logout(&self, token: &str) -> Result<()>;
}

/// Runs title searches against a [`SubtitleService`].
pub struct SubtitleLookup<S> {
    service: S,
}

impl<S: SubtitleService> SubtitleLookup<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Search every query variant of `title` and concatenate the results.
    /// Errors are returned as-is; retrying is the caller's business. The
    /// session is released even when a search fails.
    pub async fn search(&self, title: &str) -> Result<Vec<SubtitleRecord>> {
        let queries = query_variants(title);
        trace!("search title={title} queries={queries:?}");
        let token = self.service.login().await?;
        let mut results = Vec::new();
        let mut outcome = Ok(());
        for query in &queries {
            match self.service.search_for_title(&token, None, query).await {
                Ok(mut found) => {
                    debug!("{} results for {query:?}", found.len());
                    results.append(&mut found);
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }
        if let Err(err) = self.service.logout(&token).await {
            warn!("failed to release subtitle session: {err:#}");
        }
        outcome?;
        Ok(results)
    }
}

/// Build the search queries for a release title.
/// With an episode marker we emit the `S01E02` and `1x02` notations of the
/// same episode; otherwise a single cleaned query.
pub fn query_variants(title: &str) -> Vec<String> {
    let title = BRACKETED.replace_all(title, " ").into_owned();
    let Some(caps) = EPISODE_MARKER.captures(&title) else {
        return vec![clean_title(&title)];
    };
    let marker_start = caps.get(0).map(|m| m.start()).unwrap_or(0);
    let number = |a: usize, b: usize| -> u32 {
        caps.get(a)
            .or_else(|| caps.get(b))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let season = number(1, 3);
    let episode = number(2, 4);
    let name = clean_title(&title[..marker_start]);
    [
        format!("{name} S{season:02}E{episode:02}"),
        format!("{name} {season}x{episode:02}"),
    ]
    .into_iter()
    .map(|v| v.trim().to_string())
    .collect()
}

/// Cut a title at its first release tag and normalize separators.
pub fn clean_title(title: &str) -> String {
    let end = RELEASE_NOISE
        .find(title)
        .map(|m| m.start())
        .unwrap_or(title.len());
    let words: Vec<&str> = title[..end]
        .split(|c: char| c.is_whitespace() || c == '.' || c == '_')
        .filter(|w| !w.is_empty())
        .collect();
    words
        .join(" ")
        .trim_end_matches(|c: char| c == '-' || c == '(' || c.is_whitespace())
        .to_string()
}

fn size_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(u64),
        Text(String),
    }
    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// `SubAddDate` is written as `YYYY-MM-DD HH:MM:SS`; RFC 3339 and bare dates
/// are accepted when reading.
pub(crate) mod added_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised date {raw:?}")))
    }

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_utc()))
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}
