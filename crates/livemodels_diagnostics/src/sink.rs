//! Collects the diagnostics a gateway reports for one build unit.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::diagnostic::Diagnostic;

/// Accumulates diagnostics while a build unit compiles.
///
/// Compilers may report from several threads; the error count is kept apart
/// from the list so that checking it never takes the lock.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.diagnostics.lock().push(diag);
    }

    /// Returns `true` once any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Drains every recorded diagnostic. The error count is kept.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    /// Copies the recorded diagnostics without draining them.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Ends the compilation: `Err` with every diagnostic if any error was
    /// recorded, otherwise `Ok` with the remaining warnings and notes.
    pub fn finish(self) -> Result<Vec<Diagnostic>, Vec<Diagnostic>> {
        let failed = self.has_errors();
        let diagnostics = self.diagnostics.into_inner();
        if failed {
            Err(diagnostics)
        } else {
            Ok(diagnostics)
        }
    }
}
