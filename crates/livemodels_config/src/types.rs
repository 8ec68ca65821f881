//! Configuration types deserialized from `models.toml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The top-level live-models configuration parsed from `models.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    /// Where models are cached and which companion sources are merged in.
    #[serde(default)]
    pub models: ModelsSection,
    /// Build cycle behavior.
    #[serde(default)]
    pub build: BuildSection,
    /// Companion-source change watching.
    #[serde(default)]
    pub watch: WatchSection,
}

/// The `[models]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsSection {
    /// Whether live models are built at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Directory holding the generated sources, digest marker and module pointer.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Directory holding hand-written companion sources.
    #[serde(default = "default_companion_dir")]
    pub companion_dir: PathBuf,
    /// File extension (without the dot) identifying companion sources.
    #[serde(default = "default_companion_extension")]
    pub companion_extension: String,
    /// Namespace handed to the code generator.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for ModelsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_dir: default_cache_dir(),
            companion_dir: default_companion_dir(),
            companion_extension: default_companion_extension(),
            namespace: default_namespace(),
        }
    }
}

/// The `[build]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// How long the external compilation callback waits for a shared lock
    /// before giving up.
    #[serde(default = "default_callback_timeout_ms")]
    pub callback_timeout_ms: u64,
    /// Whether the last build failure is written to `models.err`.
    #[serde(default = "default_true")]
    pub write_error_file: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            callback_timeout_ms: default_callback_timeout_ms(),
            write_error_file: true,
        }
    }
}

/// The `[watch]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Whether companion sources are watched for changes.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ModelsConfig {
    /// Resolves the cache directory against the host's root directory.
    pub fn cache_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.models.cache_dir)
    }

    /// Resolves the companion source directory against the host's root directory.
    pub fn companion_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.models.companion_dir)
    }

    /// The shared-lock timeout for the external compilation callback.
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_millis(self.build.callback_timeout_ms)
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("models-cache")
}

fn default_companion_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_companion_extension() -> String {
    "rs".to_string()
}

fn default_namespace() -> String {
    "Models".to_string()
}

fn default_callback_timeout_ms() -> u64 {
    250
}
