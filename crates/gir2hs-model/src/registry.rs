//! The API index: resolution of named types.
//!
//! Named type descriptors only carry a `namespace.name` pair; whether that
//! pair is a reference-counted object, a boxed struct, or a plain enum is
//! recorded here. The index is built once from the loaded declarations and
//! read-only for the rest of the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// What a registered name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedKind {
    /// Reference-counted, polymorphic class type.
    Object,
    /// Capability set implemented by objects; polymorphic without
    /// inheritance.
    Interface,
    /// Value-like record. Boxed structs have a registered copy/free pair.
    Struct { boxed: bool },
    /// Value-like union, optionally boxed.
    Union { boxed: bool },
    /// C enumeration; scalar-like, no cleanup.
    Enum,
    /// Bit-flag enumeration; scalar-like, no cleanup.
    Flags,
    /// Function-pointer type.
    Callback,
}

/// Name → kind resolution table for one generation run.
#[derive(Debug, Default, Clone)]
pub struct ApiIndex {
    entries: BTreeMap<(String, String), NamedKind>,
}

impl ApiIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named type. Registering the same name twice is an error.
    pub fn register(&mut self, namespace: &str, name: &str, kind: NamedKind) -> Result<()> {
        let key = (namespace.to_string(), name.to_string());
        if self.entries.contains_key(&key) {
            return Err(ModelError::DuplicateType {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        self.entries.insert(key, kind);
        Ok(())
    }

    /// Look a name up, if registered.
    pub fn lookup(&self, namespace: &str, name: &str) -> Option<NamedKind> {
        self.entries
            .get(&(namespace.to_string(), name.to_string()))
            .copied()
    }

    /// Look a name up, failing with a descriptive error when missing.
    pub fn resolve(&self, namespace: &str, name: &str) -> Result<NamedKind> {
        self.lookup(namespace, name)
            .ok_or_else(|| ModelError::UnknownNamedType {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_resolve() {
        let mut index = ApiIndex::new();
        index.register("Gtk", "Widget", NamedKind::Object).unwrap();
        index
            .register("Gtk", "Orientable", NamedKind::Interface)
            .unwrap();
        index
            .register("Gdk", "Rectangle", NamedKind::Struct { boxed: true })
            .unwrap();

        assert_eq!(index.resolve("Gtk", "Widget").unwrap(), NamedKind::Object);
        assert_eq!(
            index.resolve("Gdk", "Rectangle").unwrap(),
            NamedKind::Struct { boxed: true }
        );
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut index = ApiIndex::new();
        index.register("Gtk", "Widget", NamedKind::Object).unwrap();
        let err = index
            .register("Gtk", "Widget", NamedKind::Enum)
            .unwrap_err();
        assert!(err.to_string().contains("Gtk.Widget"));
    }

    #[test]
    fn unknown_name_is_error() {
        let index = ApiIndex::new();
        assert!(index.lookup("Gtk", "Nope").is_none());
        let err = index.resolve("Gtk", "Nope").unwrap_err();
        assert!(matches!(err, ModelError::UnknownNamedType { .. }));
    }
}
