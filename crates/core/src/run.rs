//! The whole pipeline: pick a show, settle its subtitle, play it.

use crate::cache::CacheStore;
use crate::config::Config;
use crate::fetch::SubtitleFetcher;
use crate::lookup::SubtitleService;
use crate::player::PlayerCommand;
use crate::prompt::Prompt;
use crate::show::{self, Show};
use anyhow::{anyhow, bail, Result};
use reqwest::Client;
use tracing::{debug, trace};

/// Pick and prepare the show without launching anything.
pub async fn prepare<S, P>(config: &Config, service: S, prompt: &P) -> Result<Show>
where
    S: SubtitleService,
    P: Prompt,
{
    trace!("prepare offline={} cache={:?}", config.offline, config.cache_dir);
    if config.offline && config.cache_dir.is_none() {
        bail!("Cannot use offline mode while cache is disabled");
    }
    let cache = CacheStore::new(config);
    cache.ensure_root().await?;
    let http = Client::new();

    let mut show = if config.offline {
        show::pick_offline(&cache, prompt)?
    } else {
        let url = config
            .feed_url
            .as_deref()
            .ok_or_else(|| anyhow!("no feed URL configured"))?;
        show::pick_online(&http, url, prompt).await?
    };

    let fetcher = SubtitleFetcher::new(config, service, prompt, http);
    let outcome = fetcher.fetch(&show).await?;
    debug!("subtitle outcome: {outcome:?}");
    show.subtitle_path = outcome.path().map(|p| p.to_path_buf());
    Ok(show)
}

/// Run the full pipeline and wait for the player to exit.
pub async fn run<S, P>(config: &Config, service: S, prompt: &P) -> Result<()>
where
    S: SubtitleService,
    P: Prompt,
{
    let show = prepare(config, service, prompt).await?;
    let cache = CacheStore::new(config);
    PlayerCommand::for_show(&show, config, &cache).launch().await
}
