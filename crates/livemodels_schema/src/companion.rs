//! Hand-written companion sources merged into every build unit.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::GenerationError;

/// Companion source files keyed by their path relative to the companion directory.
///
/// Kept in a `BTreeMap` so iteration order, and therefore every digest and
/// build unit derived from it, does not depend on directory listing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanionSources {
    files: BTreeMap<PathBuf, String>,
}

impl CompanionSources {
    /// Creates an empty set of companion sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every file with the given extension directly inside `dir`.
    ///
    /// Files named in `exclude` (the cache's own generated files) are skipped.
    /// A missing directory yields an empty set.
    pub fn load(dir: &Path, extension: &str, exclude: &[&str]) -> Result<Self, GenerationError> {
        let mut sources = Self::new();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(sources),
            Err(e) => {
                return Err(GenerationError::Companion {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
        };

        for entry in entries {
            let entry = entry.map_err(|e| GenerationError::Companion {
                path: dir.to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if exclude.contains(&name) {
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|e| GenerationError::Companion {
                    path: path.clone(),
                    source: e,
                })?;
            sources.insert(name, text);
        }
        Ok(sources)
    }

    /// Adds or replaces one companion source.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    /// Iterates sources in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, t)| (p.as_path(), t.as_str()))
    }

    /// Number of companion files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if there are no companion files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl<P: Into<PathBuf>, T: Into<String>> FromIterator<(P, T)> for CompanionSources {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut sources = Self::new();
        for (path, text) in iter {
            sources.insert(path, text);
        }
        sources
    }
}
