//! ConstantNamespace: every scalar of a JSON document addressable by an
//! upper-case identifier.
//!
//! Naming rules:
//!   object  -> children prefixed with `UPPERCASE(key)_`
//!   array   -> children prefixed with `<index>_`
//!   scalar  -> accumulated prefix, trailing `_` trimmed, every character outside
//!              `[A-Za-z0-9_]` replaced with `_`
//!
//!   {"A": {"B": 1}, "C": [2, 3]}  ->  A_B = 1, C_0 = 2, C_1 = 3
//!
//! A namespace is a plain value. Build one per document and pass it by reference
//! to whatever evaluates against it.

use hashbrown::HashMap;
use serde_json::Value as JsonValue;

use crate::Scalar;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantNamespace {
    entries: HashMap<String, Scalar>,
}

impl ConstantNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `doc` into a fresh namespace.
    pub fn flatten(doc: &JsonValue) -> Self {
        let mut ns = Self::new();
        ns.extend_from(doc);
        ns
    }

    /// Flatten `doc` into this namespace, overwriting identifiers that collide.
    pub fn extend_from(&mut self, doc: &JsonValue) {
        let mut prefix = String::new();
        self.visit(doc, &mut prefix);
    }

    fn visit(&mut self, value: &JsonValue, prefix: &mut String) {
        match value {
            JsonValue::Object(map) => {
                for (key, child) in map {
                    let len = prefix.len();
                    prefix.push_str(&key.to_uppercase());
                    prefix.push('_');
                    self.visit(child, prefix);
                    prefix.truncate(len);
                }
            }
            JsonValue::Array(items) => {
                for (i, child) in items.iter().enumerate() {
                    let len = prefix.len();
                    prefix.push_str(&i.to_string());
                    prefix.push('_');
                    self.visit(child, prefix);
                    prefix.truncate(len);
                }
            }
            terminal => {
                let name = sanitize_identifier(prefix.trim_end_matches('_'));
                if name.is_empty() {
                    return;
                }
                if let Some(scalar) = Scalar::from_json(terminal) {
                    self.entries.insert(name, scalar);
                }
            }
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.entries.get(name)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Scalar::as_number)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Identifiers in lexical order; used for diagnostics dumps.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
