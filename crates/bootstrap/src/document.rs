//! Engine config documents.
//!
//! A [`ConfigDocument`] is an ordered map from dotted keys
//! (`cluster.routing.allocation.awareness.attributes`) to scalar or list
//! values. Documents are layered with [`ConfigDocument::merge`]: the last
//! writer of a key wins, keys keep the position of their first insertion.
//!
//! Rendering produces the engine's own config syntax, one `key: value`
//! entry per line.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A value in an engine config document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    fn from_toml(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Self::String(s),
            toml::Value::Integer(i) => Self::Integer(i),
            toml::Value::Float(f) => Self::Float(f),
            toml::Value::Boolean(b) => Self::Bool(b),
            toml::Value::Datetime(d) => Self::String(d.to_string()),
            toml::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_toml).collect())
            }
            // Tables are flattened by the caller; nested tables inside arrays
            // have no dotted-key form, so they are kept as their TOML text.
            toml::Value::Table(t) => Self::String(t.to_string()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => {
                if needs_quoting(s) {
                    // JSON strings are valid double-quoted scalars
                    let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
                    write!(f, "{quoted}")
                } else {
                    write!(f, "{s}")
                }
            }
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

/// Whether a plain string would be misread by the engine's config parser.
fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s.trim() != s {
        return true;
    }

    const RESERVED: [&str; 8] = ["true", "false", "yes", "no", "on", "off", "null", "~"];
    if RESERVED.contains(&s.to_lowercase().as_str()) {
        return true;
    }

    if s.parse::<f64>().is_ok() {
        return true;
    }

    let first = s.chars().next().unwrap_or(' ');
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return true;
    }

    s.contains(": ")
        || s.contains(" #")
        || s.ends_with(':')
        || s.contains([',', '[', ']', '{', '}', '\n'])
}

/// Ordered dotted-key configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document, flattening nested tables into dotted keys.
    ///
    /// `[cluster]\nname = "x"` and `"cluster.name" = "x"` produce the same
    /// entry.
    pub fn from_toml(name: &str, text: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(text).map_err(|e| Error::InvalidTemplate {
            name: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_table(table))
    }

    pub(crate) fn from_table(table: toml::Table) -> Self {
        let mut doc = Self::new();
        flatten_into(&mut doc, "", table);
        doc
    }

    /// Set a key, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Layer `overlay` on top of this document. Last writer wins.
    pub fn merge(&mut self, overlay: &ConfigDocument) {
        for (key, value) in &overlay.entries {
            self.set(key.clone(), value.clone());
        }
    }

    /// Return a copy of this document layered with `overlay`.
    pub fn merged(&self, overlay: &ConfigDocument) -> ConfigDocument {
        let mut doc = self.clone();
        doc.merge(overlay);
        doc
    }

    /// Entries of this document whose keys `other` does not set.
    pub fn without_keys(&self, other: &ConfigDocument) -> ConfigDocument {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| !other.contains_key(k))
                .cloned()
                .collect(),
        }
    }

    /// Render in the engine's config syntax, one entry per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(&value.to_string());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigDocument {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut doc = Self::new();
        for (k, v) in iter {
            doc.set(k, v);
        }
        doc
    }
}

fn flatten_into(doc: &mut ConfigDocument, prefix: &str, table: toml::Table) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten_into(doc, &full_key, nested),
            other => doc.set(full_key, ConfigValue::from_toml(other)),
        }
    }
}
