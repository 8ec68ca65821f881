//! What a compiled model module exposes to the cache.
//!
//! Generated and companion model types are not discovered by inspecting the
//! module at runtime. Instead the module hands over a registry of
//! [`ModelTypeDecl`]s, each carrying its constructors as plain factory
//! functions.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use livemodels_common::{Alias, ContentHash};

use crate::version::BuildVersion;

/// The untyped runtime object each generated model wraps.
pub trait PublishedElement: Send + Sync + fmt::Debug {
    /// Alias of the content type this element is an instance of.
    fn content_type(&self) -> &Alias;
}

/// Shared handle to a backing element.
pub type ElementRef = Arc<dyn PublishedElement>;

/// A strongly-typed model wrapping a backing element.
pub trait Model: Send + Sync + fmt::Debug {
    /// Name of the model type.
    fn type_name(&self) -> &str;

    /// The backing element this model wraps.
    fn element(&self) -> &ElementRef;
}

/// Shared handle to a model instance.
pub type ModelRef = Arc<dyn Model>;

/// Factory building a model from its backing element.
pub type ModelCtor = Arc<dyn Fn(ElementRef) -> ModelRef + Send + Sync>;

/// A constructor declared by a model type.
#[derive(Clone)]
pub enum Constructor {
    /// Takes exactly the backing element. Every model type needs one of these.
    Element(ModelCtor),
    /// Any other signature, described by its parameter type names.
    Other {
        /// Parameter type names, in order.
        params: Vec<String>,
    },
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constructor::Element(_) => f.write_str("Constructor::Element(..)"),
            Constructor::Other { params } => {
                f.debug_struct("Constructor::Other").field("params", params).finish()
            }
        }
    }
}

/// A model type registered by a compiled module.
#[derive(Clone, Debug)]
pub struct ModelTypeDecl {
    /// Name of the type.
    pub type_name: String,
    /// Content type alias the type is registered for. Defaults to the type
    /// name when absent.
    pub alias: Option<Alias>,
    /// Abstract types are skipped when building the model set.
    pub is_abstract: bool,
    /// Every constructor the type declares.
    pub constructors: Vec<Constructor>,
}

impl ModelTypeDecl {
    /// Declares a concrete type with one element constructor.
    pub fn new(type_name: impl Into<String>, alias: impl Into<Alias>, ctor: ModelCtor) -> Self {
        Self {
            type_name: type_name.into(),
            alias: Some(alias.into()),
            is_abstract: false,
            constructors: vec![Constructor::Element(ctor)],
        }
    }

    /// The alias the type resolves to.
    pub fn resolved_alias(&self) -> Alias {
        self.alias
            .clone()
            .unwrap_or_else(|| Alias::new(self.type_name.as_str()))
    }
}

/// A loaded module produced by the compiler gateway.
pub trait CompiledModule: Send + Sync {
    /// Location the module was loaded from; persisted as the module pointer.
    fn location(&self) -> &Path;

    /// Build version the module was compiled with.
    fn build_version(&self) -> BuildVersion;

    /// The digest embedded in the module when it was compiled, if any.
    fn digest_marker(&self) -> Option<ContentHash>;

    /// Every model type the module registers.
    fn model_types(&self) -> Vec<ModelTypeDecl>;
}

/// Name of the backing element type, used when no typed model is available.
pub const BACKING_ELEMENT_TYPE: &str = "PublishedElement";

/// Name of the generic list type.
pub const LIST_TYPE: &str = "List";

/// A type expression that may reference models by content type alias.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    /// Placeholder for the model generated for a content type.
    Model(Alias),
    /// A concrete named type.
    Named(String),
    /// A generic instantiation such as `List<Page>`.
    Generic {
        /// Generic type name.
        name: String,
        /// Type arguments.
        args: Vec<TypeRef>,
    },
    /// An array of the element type.
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// Placeholder for the model of `alias`.
    pub fn model(alias: impl Into<Alias>) -> Self {
        TypeRef::Model(alias.into())
    }

    /// `List<item>`.
    pub fn list_of(item: TypeRef) -> Self {
        TypeRef::Generic {
            name: LIST_TYPE.to_string(),
            args: vec![item],
        }
    }

    /// Returns `true` if the expression still contains a model placeholder.
    pub fn has_placeholders(&self) -> bool {
        match self {
            TypeRef::Model(_) => true,
            TypeRef::Named(_) => false,
            TypeRef::Generic { args, .. } => args.iter().any(TypeRef::has_placeholders),
            TypeRef::Array(elem) => elem.has_placeholders(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Model(alias) => write!(f, "{{{alias}}}"),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Generic { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            TypeRef::Array(elem) => write!(f, "[{elem}]"),
        }
    }
}
