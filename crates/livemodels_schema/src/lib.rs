//! Content schema and code generator adaptation for live models.
//!
//! The schema provider hands over [`ContentTypeDescriptor`]s; this crate turns
//! them into [`TypeModel`]s (applying rename/ignore directives, resolving
//! mixins, and naming generated types) and defines the [`CodeGenerator`] seam
//! through which the external templating generator is invoked.

#![warn(missing_docs)]

pub mod companion;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod provider;
pub mod type_model;

pub use companion::CompanionSources;
pub use descriptor::{ContentKind, ContentTypeDescriptor, Directives, PropertyDescriptor};
pub use error::{GenerationError, SchemaError};
pub use generator::{CodeGenerator, GeneratorOptions};
pub use provider::{SchemaProvider, StaticSchemaProvider};
pub use type_model::{build_type_models, PropertyModel, TypeModel};
