//! The published result of one successful build.
//!
//! A [`ModelSet`] is immutable once built. The cache replaces it as a whole,
//! so readers holding an older set keep a consistent view.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use livemodels_common::Alias;

use crate::error::BuildError;
use crate::module::{
    CompiledModule, Constructor, ElementRef, ModelCtor, ModelRef, TypeRef, BACKING_ELEMENT_TYPE,
    LIST_TYPE,
};
use crate::version::BuildVersion;

/// A model instance, or the backing element itself when no typed model exists.
#[derive(Clone, Debug)]
pub enum Instance {
    /// A typed model built by the alias's constructor.
    Typed(ModelRef),
    /// The unmodified backing element.
    Untyped(ElementRef),
}

impl Instance {
    /// The backing element, typed or not.
    pub fn element(&self) -> &ElementRef {
        match self {
            Instance::Typed(model) => model.element(),
            Instance::Untyped(element) => element,
        }
    }

    /// The typed model, if one was built.
    pub fn as_model(&self) -> Option<&ModelRef> {
        match self {
            Instance::Typed(model) => Some(model),
            Instance::Untyped(_) => None,
        }
    }

    /// Returns `true` if a typed model was built.
    pub fn is_typed(&self) -> bool {
        matches!(self, Instance::Typed(_))
    }
}

/// A list whose item type is the model type of one alias.
///
/// Elements pushed into a typed list are wrapped by the model constructor;
/// an untyped list keeps them as they are.
#[derive(Clone)]
pub struct ModelList {
    item_type: String,
    ctor: Option<ModelCtor>,
    items: Vec<Instance>,
}

impl ModelList {
    /// An empty list of backing elements.
    pub fn untyped() -> Self {
        Self {
            item_type: BACKING_ELEMENT_TYPE.to_string(),
            ctor: None,
            items: Vec::new(),
        }
    }

    /// Name of the item type.
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Returns `true` if items are wrapped in a model type.
    pub fn is_typed(&self) -> bool {
        self.ctor.is_some()
    }

    /// Appends an element, wrapping it when the list is typed.
    pub fn push(&mut self, element: ElementRef) {
        let item = match &self.ctor {
            Some(ctor) => Instance::Typed(ctor(element)),
            None => Instance::Untyped(element),
        };
        self.items.push(item);
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the list has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.items.iter()
    }
}

impl fmt::Debug for ModelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelList")
            .field("item_type", &self.item_type)
            .field("items", &self.items)
            .finish()
    }
}

type ListFactory = Arc<dyn Fn() -> ModelList + Send + Sync>;

/// Constructor and list factory for one alias.
pub struct ModelDescriptor {
    alias: Alias,
    type_name: String,
    ctor: ModelCtor,
    list_factory: OnceLock<ListFactory>,
}

impl ModelDescriptor {
    /// The alias this descriptor serves.
    pub fn alias(&self) -> &Alias {
        &self.alias
    }

    /// Name of the produced model type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Name of the list counterpart, e.g. `List<Page>`.
    pub fn list_type_name(&self) -> String {
        format!("{LIST_TYPE}<{}>", self.type_name)
    }

    /// Wraps a backing element in the model type.
    pub fn create(&self, element: ElementRef) -> ModelRef {
        (self.ctor)(element)
    }

    /// Creates an empty typed list. The factory is built on first use.
    pub fn create_list(&self) -> ModelList {
        let factory = self.list_factory.get_or_init(|| {
            let item_type = self.type_name.clone();
            let ctor = self.ctor.clone();
            Arc::new(move || ModelList {
                item_type: item_type.clone(),
                ctor: Some(ctor.clone()),
                items: Vec::new(),
            })
        });
        factory()
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("alias", &self.alias)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Mapping from content type alias to model descriptor, plus the module the
/// types came from.
pub struct ModelSet {
    generation: u64,
    models: HashMap<Alias, ModelDescriptor>,
    list_types: HashMap<String, String>,
    module: Option<Arc<dyn CompiledModule>>,
}

impl ModelSet {
    /// A set with no models. Every read degrades to the backing element.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            models: HashMap::new(),
            list_types: HashMap::new(),
            module: None,
        }
    }

    /// Extracts every concrete model type from a compiled module.
    ///
    /// Abstract types are skipped. Every other type must have exactly one
    /// element constructor, and no two types may claim the same alias.
    pub fn from_module(
        generation: u64,
        module: Arc<dyn CompiledModule>,
    ) -> Result<Self, BuildError> {
        let mut models: HashMap<Alias, ModelDescriptor> = HashMap::new();
        let mut list_types = HashMap::new();

        for decl in module.model_types() {
            if decl.is_abstract {
                continue;
            }
            let mut element_ctors = decl.constructors.iter().filter_map(|c| match c {
                Constructor::Element(ctor) => Some(ctor),
                Constructor::Other { .. } => None,
            });
            let ctor = match (element_ctors.next(), element_ctors.count()) {
                (Some(ctor), 0) => ctor.clone(),
                (first, rest) => {
                    return Err(BuildError::Shape {
                        type_name: decl.type_name,
                        found: usize::from(first.is_some()) + rest,
                    });
                }
            };

            let alias = decl.resolved_alias();
            if let Some(existing) = models.get(&alias) {
                return Err(BuildError::AliasConflict {
                    alias: alias.key().to_string(),
                    first: existing.type_name.clone(),
                    second: decl.type_name,
                });
            }

            let descriptor = ModelDescriptor {
                alias: alias.clone(),
                type_name: decl.type_name,
                ctor,
                list_factory: OnceLock::new(),
            };
            list_types.insert(descriptor.type_name.clone(), descriptor.list_type_name());
            models.insert(alias, descriptor);
        }

        Ok(Self {
            generation,
            models,
            list_types,
            module: Some(module),
        })
    }

    /// Publication counter. A later set always has a larger generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build version of the module, if the set came from one.
    pub fn build_version(&self) -> Option<BuildVersion> {
        self.module.as_ref().map(|m| m.build_version())
    }

    /// The module the models were loaded from.
    pub fn module(&self) -> Option<&Arc<dyn CompiledModule>> {
        self.module.as_ref()
    }

    /// Looks up the descriptor for an alias, ignoring case.
    pub fn get(&self, alias: &str) -> Option<&ModelDescriptor> {
        self.models.get(alias.to_lowercase().as_str())
    }

    /// Every alias in the set, in no particular order.
    pub fn aliases(&self) -> impl Iterator<Item = &Alias> {
        self.models.keys()
    }

    /// Number of model types.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Returns `true` if the set holds no model types.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Replaces model placeholders with published type names.
    ///
    /// `List<{alias}>` maps to the list counterpart of the model type. An alias
    /// without a published type maps to the backing element type.
    pub fn map_type(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Model(alias) => TypeRef::Named(self.type_name_for(alias).to_string()),
            TypeRef::Named(_) => ty.clone(),
            TypeRef::Generic { name, args } => {
                if let (LIST_TYPE, [TypeRef::Model(alias)]) = (name.as_str(), args.as_slice()) {
                    if let Some(list) = self
                        .get(alias.key())
                        .and_then(|d| self.list_types.get(&d.type_name))
                    {
                        return TypeRef::Named(list.clone());
                    }
                }
                TypeRef::Generic {
                    name: name.clone(),
                    args: args.iter().map(|arg| self.map_type(arg)).collect(),
                }
            }
            TypeRef::Array(elem) => TypeRef::Array(Box::new(self.map_type(elem))),
        }
    }

    /// Wraps an element in the model type for its content type, or returns it
    /// unchanged when no model is published for that alias.
    pub fn create_instance(&self, element: ElementRef) -> Instance {
        match self.get(element.content_type().key()) {
            Some(descriptor) => Instance::Typed(descriptor.create(element)),
            None => Instance::Untyped(element),
        }
    }

    /// Creates an empty list typed for an alias, or an untyped list.
    pub fn create_list(&self, alias: &str) -> ModelList {
        match self.get(alias) {
            Some(descriptor) => descriptor.create_list(),
            None => ModelList::untyped(),
        }
    }

    fn type_name_for(&self, alias: &Alias) -> &str {
        self.get(alias.key())
            .map(|d| d.type_name.as_str())
            .unwrap_or(BACKING_ELEMENT_TYPE)
    }
}

impl fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut aliases: Vec<&str> = self.models.keys().map(Alias::key).collect();
        aliases.sort_unstable();
        f.debug_struct("ModelSet")
            .field("generation", &self.generation)
            .field("aliases", &aliases)
            .field("build_version", &self.build_version())
            .finish()
    }
}
