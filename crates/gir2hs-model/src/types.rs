//! Native type descriptors.
//!
//! A [`TypeDesc`] is the abstract shape of a C-side type as described by the
//! interface metadata: scalars, strings, named API types, the canonical
//! container kinds, and the error type. Descriptors are immutable and shared
//! by reference for the duration of a generation run.

use serde::{Deserialize, Serialize};

/// Scalar (machine-word) kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Boolean,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    /// Platform-sized unsigned integer (`gsize`).
    Size,
    /// A Unicode code point stored in a 32-bit integer.
    UniChar,
    /// Runtime type tag (`GType`).
    GType,
}

/// String encodings the native side distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringKind {
    /// NUL-terminated UTF-8 text.
    Utf8,
    /// NUL-terminated string in the platform filename encoding.
    FileName,
}

/// Abstract native type descriptor.
///
/// `Named` types resolve to an object, interface, struct, union, enum, or
/// callback through the API index; everything else is structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum TypeDesc {
    /// Plain scalar value.
    Scalar(ScalarKind),
    /// NUL-terminated string.
    String(StringKind),
    /// A type registered in the API index under `namespace.name`.
    Named { namespace: String, name: String },
    /// C array with a size fixed in the metadata.
    FixedArray { elem: Box<TypeDesc>, size: usize },
    /// C array whose length travels in a companion argument.
    LengthArray {
        elem: Box<TypeDesc>,
        /// Index of the argument carrying the element count.
        length_index: usize,
    },
    /// NULL-terminated C array.
    ZeroTerminatedArray { elem: Box<TypeDesc> },
    /// Growable array (`GArray`).
    GrowableArray { elem: Box<TypeDesc> },
    /// Pointer array (`GPtrArray`).
    PointerArray { elem: Box<TypeDesc> },
    /// Byte buffer (`GByteArray`).
    ByteArray,
    /// Doubly linked list (`GList`).
    List { elem: Box<TypeDesc> },
    /// Singly linked list (`GSList`).
    SList { elem: Box<TypeDesc> },
    /// Hash table (`GHashTable`).
    HashTable {
        key: Box<TypeDesc>,
        value: Box<TypeDesc>,
    },
    /// Native error record (`GError`).
    Error,
}

impl TypeDesc {
    /// The element type, for container kinds that have one.
    pub fn element(&self) -> Option<&TypeDesc> {
        match self {
            TypeDesc::FixedArray { elem, .. }
            | TypeDesc::LengthArray { elem, .. }
            | TypeDesc::ZeroTerminatedArray { elem }
            | TypeDesc::GrowableArray { elem }
            | TypeDesc::PointerArray { elem }
            | TypeDesc::List { elem }
            | TypeDesc::SList { elem } => Some(elem),
            _ => None,
        }
    }

    /// The companion length-argument index, for length-prefixed arrays.
    pub fn length_index(&self) -> Option<usize> {
        match self {
            TypeDesc::LengthArray { length_index, .. } => Some(*length_index),
            _ => None,
        }
    }

    /// Whether this descriptor is any array kind.
    pub fn is_array(&self) -> bool {
        matches!(
            self,
            TypeDesc::FixedArray { .. }
                | TypeDesc::LengthArray { .. }
                | TypeDesc::ZeroTerminatedArray { .. }
                | TypeDesc::GrowableArray { .. }
                | TypeDesc::PointerArray { .. }
                | TypeDesc::ByteArray
        )
    }
}

impl std::fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDesc::Scalar(k) => write!(f, "{k:?}"),
            TypeDesc::String(StringKind::Utf8) => write!(f, "utf8"),
            TypeDesc::String(StringKind::FileName) => write!(f, "filename"),
            TypeDesc::Named { namespace, name } => write!(f, "{namespace}.{name}"),
            TypeDesc::FixedArray { elem, size } => write!(f, "array<{elem}; {size}>"),
            TypeDesc::LengthArray { elem, length_index } => {
                write!(f, "array<{elem}; len@{length_index}>")
            }
            TypeDesc::ZeroTerminatedArray { elem } => write!(f, "array<{elem}; zero-terminated>"),
            TypeDesc::GrowableArray { elem } => write!(f, "GArray<{elem}>"),
            TypeDesc::PointerArray { elem } => write!(f, "GPtrArray<{elem}>"),
            TypeDesc::ByteArray => write!(f, "GByteArray"),
            TypeDesc::List { elem } => write!(f, "GList<{elem}>"),
            TypeDesc::SList { elem } => write!(f, "GSList<{elem}>"),
            TypeDesc::HashTable { key, value } => write!(f, "GHashTable<{key}, {value}>"),
            TypeDesc::Error => write!(f, "GError"),
        }
    }
}
