//! RSS feed reading.

use anyhow::{Context, Result};
use reqwest::Client;
use rss::Channel;
use tracing::{debug, trace};

/// One episode announced by the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    /// Usually a magnet URI; falls back to the enclosure URL.
    pub link: String,
}

/// Download `url` and return its items in feed order.
pub async fn read_feed(client: &Client, url: &str) -> Result<Vec<FeedItem>> {
    trace!("read_feed url={url}");
    let bytes = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching feed {url}"))?
        .error_for_status()?
        .bytes()
        .await?;
    parse_feed(&bytes)
}

/// Parse an RSS document. Items without a title or a link are skipped.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let channel = Channel::read_from(bytes).context("parsing RSS feed")?;
    let items: Vec<FeedItem> = channel
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.title()?.trim();
            let link = item
                .link()
                .or_else(|| item.enclosure().map(|e| e.url()))?
                .trim();
            (!title.is_empty() && !link.is_empty()).then(|| FeedItem {
                title: title.to_string(),
                link: link.to_string(),
            })
        })
        .collect();
    debug!("feed lists {} episodes", items.len());
    Ok(items)
}
