//! Human-readable names for volumes, surfaces and universes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A name plus an extension that disambiguates otherwise identical names.
///
/// Ordering is lexicographic on `(name, ext)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
    /// Primary name.
    pub name: String,
    /// Extension, often the name of the owning universe.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ext: String,
}

impl Label {
    /// Default separator between name and extension.
    pub const SEPARATOR: char = '@';

    /// Create a label from a name and an extension.
    pub fn new(name: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
        }
    }

    /// Split `"name<sep>ext"` at the last separator.
    ///
    /// A string without the separator becomes a bare name.
    pub fn from_separator(s: &str, sep: char) -> Self {
        match s.rfind(sep) {
            Some(idx) => Self::new(&s[..idx], &s[idx + sep.len_utf8()..]),
            None => Self::new(s, ""),
        }
    }

    /// Whether both the name and extension are empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.ext.is_empty()
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self::new(name, "")
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Self { name, ext: String::new() }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.ext.is_empty() {
            write!(f, "{}{}", Self::SEPARATOR, self.ext)?;
        }
        Ok(())
    }
}
