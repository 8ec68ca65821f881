//! Filesystem watcher feeding change events into the cache.

use std::path::Path;
use std::sync::{Arc, Weak};

use livemodels_config::ModelsConfig;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::live::LiveModels;

/// Watches the companion directory and invalidates the cache on change.
///
/// Dropping the watcher unregisters it. Hosts drop it before the cache on
/// shutdown so no invalidation arrives mid-teardown.
pub struct FsWatcher {
    _watcher: RecommendedWatcher,
}

impl FsWatcher {
    /// Starts watching `dir` (non-recursively) on behalf of `models`.
    pub fn new(models: &Arc<LiveModels>, dir: &Path) -> notify::Result<Self> {
        let target: Weak<LiveModels> = Arc::downgrade(models);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "models watcher error");
                    return;
                }
            };
            if !is_relevant(&event.kind) {
                return;
            }
            let Some(models) = target.upgrade() else {
                return;
            };
            for path in &event.paths {
                models.on_path_changed(path);
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(path = %dir.display(), "watching companion sources");
        Ok(Self { _watcher: watcher })
    }

    /// Watches the configured companion directory, if watching is enabled and
    /// the directory exists.
    pub fn from_config(
        models: &Arc<LiveModels>,
        config: &ModelsConfig,
        root: &Path,
    ) -> notify::Result<Option<Self>> {
        if !config.watch.enabled {
            return Ok(None);
        }
        let dir = config.companion_dir(root);
        if !dir.is_dir() {
            tracing::debug!(path = %dir.display(), "no companion directory to watch");
            return Ok(None);
        }
        Self::new(models, &dir).map(Some)
    }
}

/// Reads never change content; everything else might.
fn is_relevant(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}
