//! Content type descriptors supplied by the schema provider.

use livemodels_common::Alias;
use serde::{Deserialize, Serialize};

/// What kind of published item a content type describes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ContentKind {
    /// Routable content (pages).
    Content,
    /// Nested elements without their own route.
    Element,
    /// Media items.
    Media,
    /// Site members.
    Member,
}

impl ContentKind {
    /// Stable tag used when digesting the schema.
    pub fn tag(self) -> u8 {
        match self {
            ContentKind::Content => 0,
            ContentKind::Element => 1,
            ContentKind::Media => 2,
            ContentKind::Member => 3,
        }
    }
}

/// Rename/ignore directives attached to a content type or property.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directives {
    /// Generate under this name instead of the one derived from the alias.
    #[serde(default)]
    pub rename: Option<String>,
    /// Leave this item out of the generated models entirely.
    #[serde(default)]
    pub ignore: bool,
}

impl Directives {
    /// Directives that rename the item.
    pub fn renamed(name: impl Into<String>) -> Self {
        Self {
            rename: Some(name.into()),
            ignore: false,
        }
    }

    /// Directives that drop the item.
    pub fn ignored() -> Self {
        Self {
            rename: None,
            ignore: true,
        }
    }
}

/// A typed property of a content type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    /// Property alias as stored in the schema.
    pub alias: String,
    /// Alias of the editor that produces the property's values.
    pub editor: String,
    /// Name of the value type exposed by the generated accessor.
    pub value_type: String,
    /// Rename/ignore directives for this property.
    #[serde(default)]
    pub directives: Directives,
}

impl PropertyDescriptor {
    /// Creates a property with no directives.
    pub fn new(
        alias: impl Into<String>,
        editor: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            editor: editor.into(),
            value_type: value_type.into(),
            directives: Directives::default(),
        }
    }
}

/// One content type of the external schema.
///
/// Snapshots are immutable for a schema revision and read-only to the cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
    /// Case-insensitive alias, unique within a schema.
    pub alias: Alias,
    /// What kind of item this content type describes.
    pub kind: ContentKind,
    /// Properties declared directly on this content type, in schema order.
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
    /// Aliases of the content types mixed into this one.
    #[serde(default)]
    pub mixins: Vec<Alias>,
    /// Rename/ignore directives for the whole type.
    #[serde(default)]
    pub directives: Directives,
}

impl ContentTypeDescriptor {
    /// Creates a content type with no properties, mixins or directives.
    pub fn new(alias: impl Into<Alias>, kind: ContentKind) -> Self {
        Self {
            alias: alias.into(),
            kind,
            properties: Vec::new(),
            mixins: Vec::new(),
            directives: Directives::default(),
        }
    }

    /// Adds a property.
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Adds a mixin.
    pub fn with_mixin(mut self, alias: impl Into<Alias>) -> Self {
        self.mixins.push(alias.into());
        self
    }

    /// Replaces the directives.
    pub fn with_directives(mut self, directives: Directives) -> Self {
        self.directives = directives;
        self
    }
}
