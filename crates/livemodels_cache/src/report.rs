//! Operator-facing error reporting.
//!
//! The reporter is a mailbox: the cache posts the last build failure and
//! clears it after the next successful build. It has no say in control flow.

use std::path::{Path, PathBuf};

use livemodels_diagnostics::{render_all, TerminalRenderer};
use parking_lot::Mutex;

use crate::error::BuildError;
use crate::store::ERROR_FILE;

/// Receives build failures for operator visibility.
pub trait ErrorReporter: Send + Sync {
    /// Records a failure. `message` is the rendered text of `error`.
    fn report(&self, message: &str, error: &BuildError);

    /// Forgets the last failure.
    fn clear(&self);
}

/// Renders a build error as operator-facing text.
///
/// Compiler diagnostics are rendered one block each, with the offending line
/// of the build unit.
pub fn describe(error: &BuildError) -> String {
    match error {
        BuildError::Compilation {
            diagnostics,
            unit_text,
        } => {
            let renderer = TerminalRenderer::new(true);
            format!(
                "{error}\n\n{}",
                render_all(&renderer, diagnostics, Some(unit_text.as_str()))
            )
        }
        other => other.to_string(),
    }
}

/// Keeps the last failure in memory.
#[derive(Default)]
pub struct MemoryErrorReporter {
    last: Mutex<Option<String>>,
}

impl MemoryErrorReporter {
    /// Creates a reporter with no recorded failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last reported message, if not cleared since.
    pub fn last(&self) -> Option<String> {
        self.last.lock().clone()
    }
}

impl ErrorReporter for MemoryErrorReporter {
    fn report(&self, message: &str, _error: &BuildError) {
        *self.last.lock() = Some(message.to_string());
    }

    fn clear(&self) {
        *self.last.lock() = None;
    }
}

/// Writes the last failure to `models.err` in the cache directory.
pub struct FileErrorReporter {
    path: PathBuf,
}

impl FileErrorReporter {
    /// Creates a reporter writing into `cache_dir`.
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            path: cache_dir.join(ERROR_FILE),
        }
    }

    /// Path of the error file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorReporter for FileErrorReporter {
    fn report(&self, message: &str, _error: &BuildError) {
        let written = self
            .path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&self.path, format!("{message}\n")));
        if let Err(e) = written {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write error file");
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove error file");
            }
        }
    }
}
