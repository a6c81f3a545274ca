//! Runtime configuration shared by every component.
//! The binary builds one `Config` from its arguments and passes it by
//! reference into the constructors that need it.

use crate::player::PlayerKind;
use std::path::PathBuf;

/// Port peerflix serves the stream on when none is given.
pub const DEFAULT_PORT: u16 = 8888;

/// Everything a run needs to know up front.
#[derive(Debug, Clone)]
pub struct Config {
    /// RSS feed listing recent episodes. Unused offline.
    pub feed_url: Option<String>,
    /// Root of the on-disk cache. `None` disables caching entirely.
    pub cache_dir: Option<PathBuf>,
    /// Preferred subtitle language (e.g. `eng`, `fre`).
    pub language: Option<String>,
    /// Play from the cache only; never touches the network.
    pub offline: bool,
    pub player: Option<PlayerKind>,
    pub port: u16,
    pub peer_port: Option<u16>,
    /// Program names used to launch the streaming helpers.
    pub peerflix_bin: String,
    pub castnow_bin: String,
    pub subtitles: SubtitleServiceConfig,
}

/// Where and how to reach the subtitle lookup service.
#[derive(Debug, Clone, Default)]
pub struct SubtitleServiceConfig {
    pub base_url: String,
    /// Empty username and password log in anonymously.
    pub username: String,
    pub password: String,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: None,
            cache_dir: None,
            language: None,
            offline: false,
            player: None,
            port: DEFAULT_PORT,
            peer_port: None,
            peerflix_bin: "peerflix".to_string(),
            castnow_bin: "castnow".to_string(),
            subtitles: SubtitleServiceConfig {
                user_agent: concat!("subcast v", env!("CARGO_PKG_VERSION")).to_string(),
                ..SubtitleServiceConfig::default()
            },
        }
    }
}
