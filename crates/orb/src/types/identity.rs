//! Object identities and facets
//!
//! An identity names one target object; a facet selects one of the
//! sub-interfaces that identity exposes. Both are plain immutable values.

use std::fmt;
use std::str::FromStr;
use super::error::OrbError;

/// Identity of a target object
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    /// Object name, unique within its category
    pub name: String,
    /// Category (empty for uncategorised objects)
    pub category: String,
}

impl Identity {
    /// Create an identity with an empty category
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
        }
    }

    /// Create an identity within a category
    pub fn with_category(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }

    /// Generate a new unique identity
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.category, self.name)
        }
    }
}

impl FromStr for Identity {
    type Err = OrbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, name) = match s.split_once('/') {
            Some((category, name)) => (category, name),
            None => ("", s),
        };
        if name.is_empty() {
            return Err(OrbError::InvalidIdentity(s.to_string()));
        }
        Ok(Self::with_category(name, category))
    }
}

/// Facet name; the empty string selects the default facet
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Facet(String);

impl Facet {
    /// The default facet
    pub const DEFAULT: Facet = Facet(String::new());

    /// Create a named facet
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Facet name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the default facet
    pub fn is_default(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Facet {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Facet {
    fn from(s: String) -> Self {
        Self(s)
    }
}
