//! Picking the episode to play.
//! Online the choices come from the RSS feed; offline they are the
//! per-show directories peerflix left in the cache.

use crate::cache::CacheStore;
use crate::feed;
use crate::prompt::Prompt;
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

/// The episode being played.
#[derive(Debug, Clone, PartialEq)]
pub struct Show {
    pub title: String,
    /// Magnet URI online, local file path offline.
    pub locator: String,
    pub subtitle_path: Option<PathBuf>,
}

/// Let the user pick one of the episodes listed by the feed at `url`.
pub async fn pick_online<P: Prompt>(client: &Client, url: &str, prompt: &P) -> Result<Show> {
    let items = feed::read_feed(client, url).await?;
    let labels: Vec<String> = items.iter().map(|i| i.title.clone()).collect();
    let index = prompt
        .choose_one("Recent available episodes", &labels)?
        .ok_or_else(|| anyhow!("no episode selected"))?;
    let item = items
        .into_iter()
        .nth(index)
        .ok_or_else(|| anyhow!("no episode selected"))?;
    info!("magnet URL: {}", item.link);
    Ok(Show {
        title: item.title,
        locator: item.link,
        subtitle_path: None,
    })
}

/// Let the user pick a cached episode directory and play its biggest file.
pub fn pick_offline<P: Prompt>(cache: &CacheStore, prompt: &P) -> Result<Show> {
    let dirs = cache.episode_dirs()?;
    let labels: Vec<String> = dirs.iter().map(|d| dir_name(d)).collect();
    let index = prompt
        .choose_one("Partially or complete available episodes", &labels)?
        .ok_or_else(|| anyhow!("no episode available offline"))?;
    let dir = dirs
        .get(index)
        .ok_or_else(|| anyhow!("no episode available offline"))?;
    let file = biggest_file(dir)?
        .ok_or_else(|| anyhow!("{} contains no files", dir.display()))?;
    info!("file path: {}", file.display());
    Ok(Show {
        title: dir_name(dir),
        locator: file.display().to_string(),
        subtitle_path: None,
    })
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Largest regular file anywhere below `dir`.
fn biggest_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut best: Option<(u64, PathBuf)> = None;
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("scanning {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let size = entry.metadata()?.len();
        match &best {
            Some((best_size, _)) if size <= *best_size => {}
            _ => best = Some((size, entry.into_path())),
        }
    }
    Ok(best.map(|(_, path)| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::prompt::scripted::ScriptedPrompt;
    use httpmock::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn offline_plays_biggest_file_of_chosen_episode() {
        let dir = tempdir().unwrap();
        let episode = dir.path().join("show-s01e02");
        fs::create_dir_all(episode.join("nested")).unwrap();
        fs::write(episode.join("sample.mkv"), vec![0u8; 10]).unwrap();
        fs::write(episode.join("nested").join("show.mkv"), vec![0u8; 100]).unwrap();
        fs::create_dir(dir.path().join("another")).unwrap();

        let cache = CacheStore::new(&Config {
            cache_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        });
        let prompt = ScriptedPrompt::new([], Some(1));
        let show = pick_offline(&cache, &prompt).unwrap();
        assert_eq!(show.title, "show-s01e02");
        assert_eq!(
            show.locator,
            episode.join("nested").join("show.mkv").display().to_string()
        );
    }

    #[test]
    fn offline_without_episodes_fails() {
        let dir = tempdir().unwrap();
        let cache = CacheStore::new(&Config {
            cache_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        });
        let prompt = ScriptedPrompt::new([], Some(0));
        assert!(pick_offline(&cache, &prompt).is_err());
    }

    /// Answers every list with the same index, in range or not.
    struct FixedChoice(usize);

    impl Prompt for FixedChoice {
        fn confirm(&self, _message: &str, default: bool) -> Result<bool> {
            Ok(default)
        }

        fn choose_one(&self, _message: &str, _options: &[String]) -> Result<Option<usize>> {
            Ok(Some(self.0))
        }
    }

    #[test]
    fn offline_choice_out_of_range_fails() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("only-show")).unwrap();
        let cache = CacheStore::new(&Config {
            cache_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        });
        assert!(pick_offline(&cache, &FixedChoice(7)).is_err());
    }

    #[tokio::test]
    async fn online_uses_the_chosen_feed_item() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rss");
                then.status(200).body(
                    r#"<rss version="2.0"><channel><title>t</title><link>l</link><description>d</description>
                    <item><title>A S01E01</title><link>magnet:?a</link></item>
                    <item><title>B S01E01</title><link>magnet:?b</link></item>
                    </channel></rss>"#,
                );
            })
            .await;
        let prompt = ScriptedPrompt::new([], Some(1));
        let show = pick_online(&Client::new(), &server.url("/rss"), &prompt)
            .await
            .unwrap();
        assert_eq!(show.title, "B S01E01");
        assert_eq!(show.locator, "magnet:?b");
        assert_eq!(show.subtitle_path, None);
    }
}
