//! Configuration file watcher for hot-reload support
//!
//! Every applied config tears down the session's sockets and registry, so
//! file events are coalesced: a reload happens once the file has been quiet
//! for `SETTLE_DELAY`, and a config equal to the last one delivered is
//! dropped.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Quiet period after the last file event before the file is read
const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Delivers each distinct valid config written to the watched file
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Load `config_path` and start watching it
    pub async fn new(config_path: String) -> Result<(Self, Arc<AppConfig>)> {
        let initial_config = AppConfig::load(&config_path)
            .await
            .context("Failed to load initial config")?;
        let initial_config = Arc::new(initial_config);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (tx, rx) = mpsc::channel(4);

        // notify callbacks run on their own OS thread; the unbounded sender
        // does not need the runtime
        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) => {
                    debug!("Config file changed: {:?}", event.paths);
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => error!("Watch error: {}", e),
            }
        })?;

        watcher
            .watch(Path::new(&config_path), RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config file: {}", config_path))?;

        tokio::spawn(reload_loop(
            config_path.clone(),
            (*initial_config).clone(),
            event_rx,
            tx,
        ));

        info!("Config file watcher started for: {}", config_path);

        Ok((Self { _watcher: watcher, rx }, initial_config))
    }

    /// Wait for the next changed, valid config
    /// Returns None if the watcher has been closed
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }
}

async fn reload_loop(
    config_path: String,
    mut current: AppConfig,
    mut events: mpsc::UnboundedReceiver<()>,
    tx: mpsc::Sender<AppConfig>,
) {
    while events.recv().await.is_some() {
        // Absorb the rest of the burst
        loop {
            match tokio::time::timeout(SETTLE_DELAY, events.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        let new_config = match AppConfig::load(&config_path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to reload config (keeping old config): {:#}", e);
                continue;
            }
        };

        if new_config == current {
            debug!("Config file rewritten without changes, not reloading");
            continue;
        }

        info!("Configuration reloaded from {}", config_path);
        current = new_config.clone();
        if tx.send(new_config).await.is_err() {
            debug!("Config receiver dropped, stopping reload loop");
            return;
        }
    }
}
