//! Error types for schema adaptation and code generation.

use std::path::PathBuf;

/// The schema is malformed or internally conflicting.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema provider itself failed.
    #[error("schema provider failed: {0}")]
    Provider(String),

    /// A content type has an empty alias.
    #[error("content type with empty alias")]
    EmptyAlias,

    /// Two content types share an alias (compared case-insensitively).
    #[error("content types '{first}' and '{second}' claim the same alias")]
    AliasConflict {
        /// Alias of the first content type, as spelled in the schema.
        first: String,
        /// Alias of the second content type, as spelled in the schema.
        second: String,
    },

    /// Two content types would generate a type with the same name.
    #[error("content types '{first}' and '{second}' both generate type '{type_name}'")]
    TypeNameCollision {
        /// The colliding generated type name.
        type_name: String,
        /// Alias of the first content type.
        first: String,
        /// Alias of the second content type.
        second: String,
    },

    /// A mixin alias does not name a (non-ignored) content type.
    #[error("content type '{content_type}' mixes in unknown content type '{mixin}'")]
    UnknownMixin {
        /// The content type declaring the mixin.
        content_type: String,
        /// The unresolved mixin alias.
        mixin: String,
    },

    /// Mixins form a cycle.
    #[error("mixin cycle through content type '{0}'")]
    MixinCycle(String),

    /// Two properties of one generated type map to the same accessor name.
    #[error("content type '{content_type}' has two properties named '{property}'")]
    DuplicateProperty {
        /// The content type whose generated type would clash.
        content_type: String,
        /// The clashing accessor name.
        property: String,
    },
}

/// The code generator could not produce usable source text.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// A companion source file could not be read.
    #[error("failed to read companion source {path}: {source}")]
    Companion {
        /// The unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The generator rejected its input.
    #[error("code generation failed: {0}")]
    Generator(String),

    /// The generator produced no source text.
    #[error("code generator produced empty output")]
    EmptyOutput,
}
