//! Binary entry point: pick an episode, fetch subtitles, start the player.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use subcast_core::config::{Config, SubtitleServiceConfig, DEFAULT_PORT};
use subcast_core::lookup::http::HttpSubtitleService;
use subcast_core::player::PlayerKind;
use subcast_core::prompt::TerminalPrompt;
use subcast_core::run::run;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser)]
#[command(name = "subcast", version, about = "Stream TV episodes with subtitles")]
struct Cli {
    /// RSS feed listing recent episodes.
    #[arg(long, env = "SUBCAST_FEED", required_unless_present = "offline")]
    feed: Option<String>,

    /// Directory for downloaded episodes, subtitles and search results.
    #[arg(long, env = "SUBCAST_CACHE")]
    cache: Option<PathBuf>,

    /// Preferred subtitle language, e.g. `eng` or `fre`.
    #[arg(long, env = "SUBCAST_LANG")]
    lang: Option<String>,

    /// Play a cached episode without touching the network.
    #[arg(long)]
    offline: bool,

    /// vlc, mpv, mplayer or chromecast.
    #[arg(long, env = "SUBCAST_PLAYER")]
    player: Option<PlayerKind>,

    /// Port peerflix streams on.
    #[arg(long, env = "SUBCAST_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Port peerflix listens on for peers.
    #[arg(long, env = "SUBCAST_PEER_PORT")]
    peer_port: Option<u16>,

    #[arg(long, env = "SUBCAST_PEERFLIX", default_value = "peerflix")]
    peerflix_bin: String,

    #[arg(long, env = "SUBCAST_CASTNOW", default_value = "castnow")]
    castnow_bin: String,

    /// Base URL of the subtitle lookup service.
    #[arg(long, env = "SUBCAST_SUBTITLES_URL", required_unless_present = "offline")]
    subtitles_url: Option<String>,

    #[arg(long, env = "SUBCAST_SUBTITLES_USER", default_value = "")]
    subtitles_user: String,

    #[arg(
        long,
        env = "SUBCAST_SUBTITLES_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    subtitles_password: String,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            feed_url: self.feed,
            cache_dir: self.cache,
            language: self.lang,
            offline: self.offline,
            player: self.player,
            port: self.port,
            peer_port: self.peer_port,
            peerflix_bin: self.peerflix_bin,
            castnow_bin: self.castnow_bin,
            subtitles: SubtitleServiceConfig {
                base_url: self.subtitles_url.unwrap_or_default(),
                username: self.subtitles_user,
                password: self.subtitles_password,
                ..defaults.subtitles
            },
        }
    }
}

/// Application entry point which parses CLI args and runs the pipeline.
/// Declining to continue without subtitles surfaces as an error, so the
/// process exits non-zero.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subcast=trace".parse().unwrap())
            .add_directive("subcast_core=trace".parse().unwrap())
            .add_directive("info".parse().unwrap())
    } else {
        EnvFilter::default()
            .add_directive("subcast=info".parse().unwrap())
            .add_directive("subcast_core=info".parse().unwrap())
            .add_directive("warn".parse().unwrap())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.into_config();
    debug!(
        "feed={:?} cache={:?} lang={:?} offline={} player={:?}",
        config.feed_url, config.cache_dir, config.language, config.offline, config.player
    );
    let service = HttpSubtitleService::new(&config.subtitles)?;
    run(&config, service, &TerminalPrompt::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_needs_no_feed() {
        let cli = Cli::try_parse_from(["subcast", "--offline", "--cache", "/tmp/c"]).unwrap();
        let config = cli.into_config();
        assert!(config.offline);
        assert_eq!(config.feed_url, None);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn parses_player_and_language() {
        let cli = Cli::try_parse_from([
            "subcast",
            "--feed",
            "http://feed",
            "--subtitles-url",
            "http://subs",
            "--player",
            "chromecast",
            "--lang",
            "fre",
        ])
        .unwrap();
        let config = cli.into_config();
        assert_eq!(config.player, Some(PlayerKind::Chromecast));
        assert_eq!(config.language.as_deref(), Some("fre"));
        assert_eq!(config.subtitles.base_url, "http://subs");
    }
}
