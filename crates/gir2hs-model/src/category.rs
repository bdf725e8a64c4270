//! Type classification.
//!
//! [`classify`] maps every legal [`TypeDesc`] to exactly one [`Category`].
//! The category is the key into every downstream dispatch table (free
//! primitives, element mapping functions, surface-type rendering), so it is
//! a closed enum: adding a variant is a compile error at each table until
//! the new case is handled.

use crate::error::Result;
use crate::registry::{ApiIndex, NamedKind};
use crate::types::TypeDesc;

/// The classification of a native type, as seen by the marshalling engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Machine scalar, passed by value, no cleanup.
    Scalar,
    /// NUL-terminated string, allocator-freed.
    String,
    /// Reference-counted class instance.
    Object,
    /// Capability set; instances are reference-counted objects.
    Interface,
    /// Record type. Boxed records have a registered free function.
    Struct { boxed: bool },
    /// Union type, optionally boxed.
    Union { boxed: bool },
    /// Enumeration or bit flags; scalar-like.
    Enum,
    /// Function-pointer type.
    Callback,
    /// C array with metadata-fixed size.
    FixedArray,
    /// C array with a companion length argument.
    LengthArray,
    /// NULL-terminated C array.
    ZeroTerminatedArray,
    /// Growable array container.
    GrowableArray,
    /// Pointer array container.
    PointerArray,
    /// Byte buffer container.
    ByteArray,
    /// Doubly linked list.
    List,
    /// Singly linked list.
    SList,
    /// Hash table.
    HashTable,
    /// Native error record.
    Error,
}

impl Category {
    /// Reference-counted kinds, i.e. those released by dropping a reference.
    pub fn is_managed(&self) -> bool {
        matches!(self, Category::Object | Category::Interface)
    }

    /// Container kinds: a shell holding elements (or bytes) that the
    /// wrapper may have to free separately from the contents.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Category::FixedArray
                | Category::LengthArray
                | Category::ZeroTerminatedArray
                | Category::GrowableArray
                | Category::PointerArray
                | Category::ByteArray
                | Category::List
                | Category::SList
                | Category::HashTable
        )
    }

    /// Linked-list kinds. These represent "absent" as the empty list, so a
    /// nullable argument of this category never gets an optional wrapper.
    pub fn is_list(&self) -> bool {
        matches!(self, Category::List | Category::SList)
    }
}

/// Classify a type descriptor.
///
/// Pure and total over legal descriptors; the only failure is a `Named`
/// descriptor whose name was never registered in the API index, which the
/// declaration loader already rules out for well-formed metadata.
pub fn classify(ty: &TypeDesc, index: &ApiIndex) -> Result<Category> {
    Ok(match ty {
        TypeDesc::Scalar(_) => Category::Scalar,
        TypeDesc::String(_) => Category::String,
        TypeDesc::Named { namespace, name } => match index.resolve(namespace, name)? {
            NamedKind::Object => Category::Object,
            NamedKind::Interface => Category::Interface,
            NamedKind::Struct { boxed } => Category::Struct { boxed },
            NamedKind::Union { boxed } => Category::Union { boxed },
            NamedKind::Enum | NamedKind::Flags => Category::Enum,
            NamedKind::Callback => Category::Callback,
        },
        TypeDesc::FixedArray { .. } => Category::FixedArray,
        TypeDesc::LengthArray { .. } => Category::LengthArray,
        TypeDesc::ZeroTerminatedArray { .. } => Category::ZeroTerminatedArray,
        TypeDesc::GrowableArray { .. } => Category::GrowableArray,
        TypeDesc::PointerArray { .. } => Category::PointerArray,
        TypeDesc::ByteArray => Category::ByteArray,
        TypeDesc::List { .. } => Category::List,
        TypeDesc::SList { .. } => Category::SList,
        TypeDesc::HashTable { .. } => Category::HashTable,
        TypeDesc::Error => Category::Error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScalarKind, StringKind};

    fn index() -> ApiIndex {
        let mut index = ApiIndex::new();
        index.register("Gtk", "Widget", NamedKind::Object).unwrap();
        index
            .register("Gtk", "Orientable", NamedKind::Interface)
            .unwrap();
        index
            .register("Gdk", "Rectangle", NamedKind::Struct { boxed: true })
            .unwrap();
        index
            .register("Gdk", "Event", NamedKind::Union { boxed: false })
            .unwrap();
        index.register("Gtk", "Align", NamedKind::Enum).unwrap();
        index
            .register("GObject", "Callback", NamedKind::Callback)
            .unwrap();
        index
    }

    #[test]
    fn structural_categories() {
        let index = ApiIndex::new();
        assert_eq!(
            classify(&TypeDesc::Scalar(ScalarKind::Int32), &index).unwrap(),
            Category::Scalar
        );
        assert_eq!(
            classify(&TypeDesc::String(StringKind::Utf8), &index).unwrap(),
            Category::String
        );
        assert_eq!(classify(&TypeDesc::ByteArray, &index).unwrap(), Category::ByteArray);
        assert_eq!(classify(&TypeDesc::Error, &index).unwrap(), Category::Error);
        assert_eq!(
            classify(
                &TypeDesc::HashTable {
                    key: Box::new(TypeDesc::String(StringKind::Utf8)),
                    value: Box::new(TypeDesc::Scalar(ScalarKind::Int32)),
                },
                &index
            )
            .unwrap(),
            Category::HashTable
        );
    }

    #[test]
    fn named_categories_via_index() {
        let index = index();
        let named = |ns: &str, n: &str| TypeDesc::Named {
            namespace: ns.to_string(),
            name: n.to_string(),
        };
        assert_eq!(classify(&named("Gtk", "Widget"), &index).unwrap(), Category::Object);
        assert_eq!(
            classify(&named("Gtk", "Orientable"), &index).unwrap(),
            Category::Interface
        );
        assert_eq!(
            classify(&named("Gdk", "Rectangle"), &index).unwrap(),
            Category::Struct { boxed: true }
        );
        assert_eq!(
            classify(&named("Gdk", "Event"), &index).unwrap(),
            Category::Union { boxed: false }
        );
        assert_eq!(classify(&named("Gtk", "Align"), &index).unwrap(), Category::Enum);
        assert_eq!(
            classify(&named("GObject", "Callback"), &index).unwrap(),
            Category::Callback
        );
    }

    #[test]
    fn unregistered_name_fails() {
        let index = ApiIndex::new();
        let ty = TypeDesc::Named {
            namespace: "Gtk".to_string(),
            name: "Widget".to_string(),
        };
        assert!(classify(&ty, &index).is_err());
    }

    #[test]
    fn predicates() {
        assert!(Category::Object.is_managed());
        assert!(Category::Interface.is_managed());
        assert!(!Category::Struct { boxed: true }.is_managed());

        assert!(Category::List.is_container());
        assert!(Category::HashTable.is_container());
        assert!(!Category::String.is_container());
        assert!(!Category::Scalar.is_container());

        assert!(Category::List.is_list());
        assert!(Category::SList.is_list());
        assert!(!Category::PointerArray.is_list());
    }
}
