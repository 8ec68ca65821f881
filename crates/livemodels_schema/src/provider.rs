//! The schema provider seam.

use parking_lot::RwLock;

use crate::descriptor::ContentTypeDescriptor;
use crate::error::SchemaError;

/// Supplies the current content-type definitions.
///
/// Called once per build cycle while the cache holds its exclusive lock, so
/// implementations must be side-effect free and fast.
pub trait SchemaProvider: Send + Sync {
    /// Returns a snapshot of every content type.
    fn schema(&self) -> Result<Vec<ContentTypeDescriptor>, SchemaError>;
}

/// A provider serving an in-memory schema that the host can replace.
#[derive(Default)]
pub struct StaticSchemaProvider {
    types: RwLock<Vec<ContentTypeDescriptor>>,
}

impl StaticSchemaProvider {
    /// Creates a provider serving the given content types.
    pub fn new(types: Vec<ContentTypeDescriptor>) -> Self {
        Self {
            types: RwLock::new(types),
        }
    }

    /// Replaces the served schema.
    pub fn replace(&self, types: Vec<ContentTypeDescriptor>) {
        *self.types.write() = types;
    }

    /// Applies an edit to the served schema in place.
    pub fn update(&self, edit: impl FnOnce(&mut Vec<ContentTypeDescriptor>)) {
        edit(&mut self.types.write());
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn schema(&self) -> Result<Vec<ContentTypeDescriptor>, SchemaError> {
        Ok(self.types.read().clone())
    }
}
