//! On-disk cache of subtitle search results and downloaded artifacts.
//! Every path is derived from a slug of the show title so that repeated
//! lookups of the same episode land on the same files.

use crate::config::Config;
use crate::lookup::SubtitleRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Search results older than this are fetched again.
pub const RESULTS_TTL: Duration = Duration::from_millis(3_600_000);

/// Cache rooted at the configured directory, or disabled when there is none.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: Option<PathBuf>,
}

impl CacheStore {
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.cache_dir.clone(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Create the cache directory if caching is enabled.
    pub async fn ensure_root(&self) -> Result<()> {
        if let Some(root) = &self.root {
            tokio::fs::create_dir_all(root)
                .await
                .with_context(|| format!("creating cache directory {}", root.display()))?;
        }
        Ok(())
    }

    /// Path of `title` with an optional extension under the cache root.
    /// Without a root, `force_temp` hands out a fresh path in the system
    /// temp directory; otherwise there is no path.
    pub fn path_for(
        &self,
        title: &str,
        extension: Option<&str>,
        force_temp: bool,
    ) -> Option<PathBuf> {
        let suffix = extension.map(|e| format!(".{e}")).unwrap_or_default();
        match &self.root {
            Some(root) => Some(root.join(format!("{}{suffix}", slugify(title)))),
            None if force_temp => Some(temp_path(&suffix)),
            None => None,
        }
    }

    /// Where the subtitle of `title` is (or will be) stored.
    pub fn subtitle_path(&self, title: &str) -> PathBuf {
        self.path_for(title, Some("srt"), true)
            .unwrap_or_else(|| temp_path(".srt"))
    }

    /// Directory peerflix downloads the episode into.
    pub fn show_dir(&self, title: &str) -> Option<PathBuf> {
        self.path_for(title, None, false)
    }

    /// Cached search results for `title`, if present and fresh.
    /// Missing, stale, unreadable or malformed entries all read as a miss.
    pub fn get(&self, title: &str) -> Option<Vec<SubtitleRecord>> {
        self.get_at(title, SystemTime::now())
    }

    fn get_at(&self, title: &str, now: SystemTime) -> Option<Vec<SubtitleRecord>> {
        let path = self.path_for(title, Some("json"), false)?;
        trace!("cache get path={}", path.display());
        let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        if !is_fresh(modified, now) {
            debug!("cached results for {title:?} expired");
            return None;
        }
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&text) {
            Ok(records) => Some(records),
            Err(err) => {
                debug!("ignoring malformed cache entry {}: {err}", path.display());
                None
            }
        }
    }

    /// Store search results for `title`. Returns whether the write happened.
    pub fn put(&self, title: &str, records: &[SubtitleRecord]) -> bool {
        let Some(path) = self.path_for(title, Some("json"), false) else {
            return false;
        };
        let written = serde_json::to_string(records)
            .map_err(anyhow::Error::from)
            .and_then(|text| fs::write(&path, text).map_err(anyhow::Error::from));
        match written {
            Ok(()) => {
                debug!("cached {} results at {}", records.len(), path.display());
                true
            }
            Err(err) => {
                warn!("could not cache results at {}: {err}", path.display());
                false
            }
        }
    }

    /// Per-show directories available for offline playback, sorted by name.
    pub fn episode_dirs(&self) -> Result<Vec<PathBuf>> {
        let Some(root) = &self.root else {
            return Ok(Vec::new());
        };
        let mut dirs = Vec::new();
        for entry in fs::read_dir(root).with_context(|| format!("reading {}", root.display()))? {
            let path = entry?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

/// A path in the system temp directory that nothing has used yet.
fn temp_path(suffix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("subcast-{}{suffix}", Uuid::new_v4()))
}

/// An entry is fresh until it is older than [`RESULTS_TTL`].
/// Timestamps in the future count as fresh.
fn is_fresh(modified: SystemTime, now: SystemTime) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age <= RESULTS_TTL,
        Err(_) => true,
    }
}

/// Lowercase, hyphen-separated, punctuation-free form of `input`.
/// Quotes are dropped rather than turned into separators.
pub fn slugify(input: &str) -> String {
    let mut slug = String::new();
    for ch in input.trim().chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if matches!(ch, '\'' | '"' | '’' | '`') {
            continue;
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::fake::record;
    use tempfile::tempdir;

    fn store(root: &Path) -> CacheStore {
        CacheStore::new(&Config {
            cache_dir: Some(root.to_path_buf()),
            ..Config::default()
        })
    }

    #[test]
    fn slugs_ignore_punctuation_variance() {
        assert_eq!(slugify("Show's Name: S01E02!"), "shows-name-s01e02");
        assert_eq!(slugify("Shows.Name.S01E02"), "shows-name-s01e02");
        assert_eq!(slugify("shows-name-s01e02"), "shows-name-s01e02");
    }

    #[test]
    fn paths_are_deterministic() {
        let dir = tempdir().unwrap();
        let cache = store(dir.path());
        let a = cache.subtitle_path("The Show S01E02 720p");
        let b = cache.subtitle_path("The.Show.S01E02.720p");
        assert_eq!(a, b);
        assert_eq!(a, dir.path().join("the-show-s01e02-720p.srt"));
        assert_eq!(cache.show_dir("The Show"), Some(dir.path().join("the-show")));
    }

    #[test]
    fn without_root_only_temp_paths_exist() {
        let cache = CacheStore::new(&Config::default());
        assert_eq!(cache.path_for("x", Some("json"), false), None);
        let temp = cache.path_for("x", Some("srt"), true).unwrap();
        assert_eq!(temp.extension().unwrap(), "srt");
        assert!(!temp.exists());
        assert!(!cache.put("x", &[]));
        assert_eq!(cache.get("x"), None);
    }

    #[test]
    fn stores_and_reads_results() {
        let dir = tempdir().unwrap();
        let cache = store(dir.path());
        let records = vec![record("eng", "2021-03-10 10:00:00", "a.srt")];
        assert!(cache.put("Show S01E02", &records));
        assert_eq!(cache.get("show s01e02"), Some(records));
    }

    #[test]
    fn expires_just_after_one_hour() {
        let dir = tempdir().unwrap();
        let cache = store(dir.path());
        assert!(cache.put("Show", &[record("eng", "2021-03-10", "a.srt")]));
        let path = cache.path_for("Show", Some("json"), false).unwrap();
        let modified = fs::metadata(path).unwrap().modified().unwrap();

        let almost = modified + Duration::from_millis(3_599_999);
        assert!(cache.get_at("Show", almost).is_some());
        let one_hour = modified + Duration::from_millis(3_600_000);
        assert!(cache.get_at("Show", one_hour).is_some());
        let expired = modified + Duration::from_millis(3_600_001);
        assert!(cache.get_at("Show", expired).is_none());
    }

    #[test]
    fn malformed_entries_are_misses() {
        let dir = tempdir().unwrap();
        let cache = store(dir.path());
        fs::write(dir.path().join("show.json"), "{not json").unwrap();
        assert_eq!(cache.get("Show"), None);
    }

    #[test]
    fn lists_episode_directories() {
        let dir = tempdir().unwrap();
        let cache = store(dir.path());
        fs::create_dir(dir.path().join("b-show")).unwrap();
        fs::create_dir(dir.path().join("a-show")).unwrap();
        fs::write(dir.path().join("a-show.srt"), "x").unwrap();
        let dirs = cache.episode_dirs().unwrap();
        assert_eq!(dirs, vec![dir.path().join("a-show"), dir.path().join("b-show")]);
    }
}
