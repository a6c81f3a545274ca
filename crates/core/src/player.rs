//! Launching the external streaming and playback programs.

use crate::cache::CacheStore;
use crate::config::Config;
use crate::show::Show;
use anyhow::{anyhow, bail, Context, Result};
use std::fmt;
use std::io::ErrorKind;
use std::str::FromStr;
use tokio::process::Command;
use tracing::info;

/// Player that ends up showing the video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Vlc,
    Mpv,
    Mplayer,
    /// Cast to a Chromecast through castnow.
    Chromecast,
}

impl PlayerKind {
    fn name(self) -> &'static str {
        match self {
            Self::Vlc => "vlc",
            Self::Mpv => "mpv",
            Self::Mplayer => "mplayer",
            Self::Chromecast => "chromecast",
        }
    }
}

impl fmt::Display for PlayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlayerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vlc" => Ok(Self::Vlc),
            "mpv" => Ok(Self::Mpv),
            "mplayer" => Ok(Self::Mplayer),
            "chromecast" => Ok(Self::Chromecast),
            other => Err(format!(
                "unknown player {other:?} (expected vlc, mpv, mplayer or chromecast)"
            )),
        }
    }
}

/// A fully resolved command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PlayerCommand {
    /// Build the command that plays `show` under `config`.
    /// Online everything goes through peerflix (or castnow for a
    /// Chromecast); offline the local file is opened by the player itself.
    pub fn for_show(show: &Show, config: &Config, cache: &CacheStore) -> Self {
        let subtitles = show
            .subtitle_path
            .as_ref()
            .map(|p| p.display().to_string());
        let show_dir = if config.offline {
            None
        } else {
            cache
                .show_dir(&show.title)
                .map(|p| p.display().to_string())
        };

        match (config.player, config.offline) {
            (Some(PlayerKind::Chromecast), offline) => {
                let mut args = vec![show.locator.clone()];
                if !offline {
                    args.extend(["--peerflix-port".to_string(), config.port.to_string()]);
                    if let Some(peer_port) = config.peer_port {
                        args.extend(["--peerflix-peer-port".to_string(), peer_port.to_string()]);
                    }
                }
                if let Some(dir) = show_dir {
                    args.extend(["--peerflix-path".to_string(), dir]);
                }
                if let Some(sub) = subtitles {
                    args.extend(["--subtitles".to_string(), sub]);
                }
                Self {
                    program: config.castnow_bin.clone(),
                    args,
                }
            }
            (player, true) => {
                let player = player.unwrap_or(PlayerKind::Mpv);
                let mut args = vec![show.locator.clone()];
                if let Some(sub) = subtitles {
                    match player {
                        PlayerKind::Mplayer => args.extend(["-sub".to_string(), sub]),
                        _ => args.push(format!("--sub-file={sub}")),
                    }
                }
                Self {
                    program: player.name().to_string(),
                    args,
                }
            }
            (player, false) => {
                let mut args = vec![
                    show.locator.clone(),
                    "--port".to_string(),
                    config.port.to_string(),
                ];
                if let Some(peer_port) = config.peer_port {
                    args.extend(["--peer-port".to_string(), peer_port.to_string()]);
                }
                if let Some(dir) = show_dir {
                    args.extend(["--path".to_string(), dir]);
                }
                if let Some(sub) = subtitles {
                    args.extend(["--subtitles".to_string(), sub]);
                }
                if let Some(player) = player {
                    args.push(format!("--{}", player.name()));
                }
                Self {
                    program: config.peerflix_bin.clone(),
                    args,
                }
            }
        }
    }

    /// Run the command with the terminal attached and wait for it.
    pub async fn launch(&self) -> Result<()> {
        info!("running {}...", self.program);
        info!("{} {}", self.program, self.args.join(" "));
        let status = match Command::new(&self.program).args(&self.args).status().await {
            Ok(status) => status,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(anyhow!("{} not found, is it installed?", self.program));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to launch {}", self.program));
            }
        };
        if !status.success() {
            bail!("{} exited with {status}", self.program);
        }
        Ok(())
    }
}
