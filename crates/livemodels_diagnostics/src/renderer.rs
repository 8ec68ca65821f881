//! Diagnostic rendering for operator-facing error reports.

use crate::diagnostic::Diagnostic;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic. `source` is the text of the build unit the
    /// diagnostic points into, when available.
    fn render(&self, diag: &Diagnostic, source: Option<&str>) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// Produces output like:
/// ```text
/// error[E0412]: cannot find type `Pge`
///   --> all.generated.rs:10:5
///    |
/// 10 |     pub parent: Pge,
///    |     ^
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to include the offending source line when the text is available.
    pub show_source: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(show_source: bool) -> Self {
        Self { show_source }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source: Option<&str>) -> String {
        let mut out = format!("{}[{}]: {}\n", diag.severity, diag.code, diag.message);

        if let Some(loc) = &diag.location {
            out.push_str(&format!("  --> {loc}\n"));

            let line_content = source
                .filter(|_| self.show_source)
                .and_then(|text| text.lines().nth((loc.line as usize).saturating_sub(1)));
            if let Some(line_content) = line_content {
                let line_num = loc.line.to_string();
                let padding = " ".repeat(line_num.len());
                let col_padding = " ".repeat((loc.column as usize).saturating_sub(1));
                out.push_str(&format!("{padding} |\n"));
                out.push_str(&format!("{line_num} | {line_content}\n"));
                out.push_str(&format!("{padding} | {col_padding}^\n"));
            }
        }

        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }

        out
    }
}

/// Renders every diagnostic with the given renderer, one block per diagnostic.
pub fn render_all(
    renderer: &dyn DiagnosticRenderer,
    diagnostics: &[Diagnostic],
    source: Option<&str>,
) -> String {
    diagnostics
        .iter()
        .map(|d| renderer.render(d, source))
        .collect::<Vec<_>>()
        .join("")
}
