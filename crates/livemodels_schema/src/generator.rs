//! The code generator seam.

use crate::companion::CompanionSources;
use crate::error::GenerationError;
use crate::type_model::TypeModel;

/// Options forwarded to the code generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Namespace the generated types live in.
    pub namespace: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            namespace: "Models".to_string(),
        }
    }
}

/// Turns type models plus companion sources into generated source text.
///
/// Implementations are pure functions of their inputs. Companion sources are
/// passed so the generator can skip members they already declare; merging them
/// into the build unit is done by the cache.
pub trait CodeGenerator: Send + Sync {
    /// Produces the generated source text.
    fn generate(
        &self,
        companions: &CompanionSources,
        models: &[TypeModel],
        options: &GeneratorOptions,
    ) -> Result<String, GenerationError>;
}
