//! Case-insensitive content-type aliases.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The alias identifying a content type in the schema.
///
/// Aliases compare and hash case-insensitively (`"page"` and `"Page"` are the
/// same alias) but remember their original spelling for display and error
/// messages.
#[derive(Clone)]
pub struct Alias {
    original: String,
    key: String,
}

impl Alias {
    /// Creates an alias from its original spelling.
    pub fn new(alias: impl Into<String>) -> Self {
        let original = alias.into();
        let key = original.to_lowercase();
        Self { original, key }
    }

    /// Returns the alias as originally spelled.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Returns the normalized (lowercase) key used for comparisons.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PartialEq for Alias {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Alias {}

impl Hash for Alias {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Alias {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Alias {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl Borrow<str> for Alias {
    fn borrow(&self) -> &str {
        &self.key
    }
}

impl From<&str> for Alias {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Alias {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl fmt::Debug for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Alias({:?})", self.original)
    }
}

impl Serialize for Alias {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Alias {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}
