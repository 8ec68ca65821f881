//! Error types for the artifact store and the build cycle.

use std::path::PathBuf;

use livemodels_diagnostics::Diagnostic;
use livemodels_schema::{GenerationError, SchemaError};

use crate::version::BuildVersion;

/// Errors raised while persisting an artifact record.
///
/// Reads never produce this error: a missing or corrupt record is a cache miss.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The module pointer could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

/// Why a build cycle failed.
///
/// Every variant aborts the current cycle only. The next call to
/// `ensure_models` starts a fresh attempt.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The schema is malformed or conflicting.
    #[error("schema error: {0}")]
    Schema(SchemaError),

    /// The generator could not produce usable source.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The host compiler rejected the build unit.
    #[error(
        "compilation of the models build unit failed with {} error(s)",
        error_count(.diagnostics)
    )]
    Compilation {
        /// Every diagnostic the compiler reported.
        diagnostics: Vec<Diagnostic>,
        /// The text of the rejected build unit, for rendering diagnostics.
        unit_text: String,
    },

    /// Two types claim the same content type alias.
    #[error("'{first}' and '{second}' both claim content type alias '{alias}'")]
    AliasConflict {
        /// The contested alias.
        alias: String,
        /// The first claimant.
        first: String,
        /// The second claimant.
        second: String,
    },

    /// A model type does not have exactly one constructor taking the backing element.
    #[error(
        "model type '{type_name}' must have exactly one constructor taking the backing element, found {found}"
    )]
    Shape {
        /// The offending type.
        type_name: String,
        /// How many such constructors were found.
        found: usize,
    },

    /// No build version is left to issue.
    #[error("build versions exhausted after {last}")]
    VersionsExhausted {
        /// The last version in use.
        last: BuildVersion,
    },
}

fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.severity.is_error()).count()
}

impl From<SchemaError> for BuildError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::AliasConflict { first, second } => BuildError::AliasConflict {
                alias: first.to_lowercase(),
                first,
                second,
            },
            other => BuildError::Schema(other),
        }
    }
}
