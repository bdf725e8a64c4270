//! Target-language surface rendering.
//!
//! Pure functions mapping type descriptors to the Haskell types that appear
//! in generated signatures, and to the pack/unpack helpers the conversion
//! statements call. Identifier choice and layout are deliberately simple;
//! they are not the interesting part of the generator.

use gir2hs_model::{classify, ApiIndex, Category, ScalarKind, StringKind, Transfer, TypeDesc};

use crate::error::Result;

/// The public (wrapper-signature) type for a descriptor.
pub fn public_type(ty: &TypeDesc, index: &ApiIndex) -> Result<String> {
    Ok(match ty {
        TypeDesc::Scalar(kind) => public_scalar(*kind).to_string(),
        TypeDesc::String(_) => "Text".to_string(),
        TypeDesc::Named { name, .. } => name.clone(),
        TypeDesc::FixedArray { elem, .. }
        | TypeDesc::LengthArray { elem, .. }
        | TypeDesc::ZeroTerminatedArray { elem }
        | TypeDesc::GrowableArray { elem }
        | TypeDesc::PointerArray { elem } => format!("[{}]", public_type(elem, index)?),
        TypeDesc::ByteArray => "ByteString".to_string(),
        TypeDesc::List { elem } | TypeDesc::SList { elem } => {
            format!("[{}]", public_type(elem, index)?)
        }
        TypeDesc::HashTable { key, value } => format!(
            "Map.Map {} {}",
            paren(&public_type(key, index)?),
            paren(&public_type(value, index)?)
        ),
        TypeDesc::Error => "GError".to_string(),
    })
}

fn public_scalar(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Boolean => "Bool",
        ScalarKind::Int8 => "Int8",
        ScalarKind::UInt8 => "Word8",
        ScalarKind::Int16 => "Int16",
        ScalarKind::UInt16 => "Word16",
        ScalarKind::Int32 => "Int32",
        ScalarKind::UInt32 => "Word32",
        ScalarKind::Int64 => "Int64",
        ScalarKind::UInt64 => "Word64",
        ScalarKind::Float => "Float",
        ScalarKind::Double => "Double",
        ScalarKind::Size => "Word64",
        ScalarKind::UniChar => "Char",
        ScalarKind::GType => "GType",
    }
}

/// The native (foreign-import) type for a descriptor.
pub fn native_type(ty: &TypeDesc, index: &ApiIndex) -> Result<String> {
    Ok(match ty {
        TypeDesc::Scalar(kind) => native_scalar(*kind).to_string(),
        TypeDesc::String(StringKind::Utf8) | TypeDesc::String(StringKind::FileName) => {
            "CString".to_string()
        }
        TypeDesc::Named { namespace, name } => match classify(ty, index)? {
            Category::Enum => "CUInt".to_string(),
            Category::Callback => format!("FunPtr {namespace}{name}C"),
            _ => format!("Ptr {name}"),
        },
        TypeDesc::FixedArray { elem, .. }
        | TypeDesc::LengthArray { elem, .. }
        | TypeDesc::ZeroTerminatedArray { elem } => {
            format!("Ptr {}", paren(&native_type(elem, index)?))
        }
        TypeDesc::GrowableArray { elem } => {
            format!("Ptr (GArray {})", paren(&native_type(elem, index)?))
        }
        TypeDesc::PointerArray { elem } => {
            format!("Ptr (GPtrArray {})", paren(&native_type(elem, index)?))
        }
        TypeDesc::ByteArray => "Ptr GByteArray".to_string(),
        TypeDesc::List { elem } => {
            format!("Ptr (GList {})", paren(&native_type(elem, index)?))
        }
        TypeDesc::SList { elem } => {
            format!("Ptr (GSList {})", paren(&native_type(elem, index)?))
        }
        TypeDesc::HashTable { key, value } => format!(
            "Ptr (GHashTable {} {})",
            paren(&native_type(key, index)?),
            paren(&native_type(value, index)?)
        ),
        TypeDesc::Error => "Ptr GError".to_string(),
    })
}

fn native_scalar(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Boolean => "CInt",
        ScalarKind::Int8 => "Int8",
        ScalarKind::UInt8 => "Word8",
        ScalarKind::Int16 => "Int16",
        ScalarKind::UInt16 => "Word16",
        ScalarKind::Int32 => "Int32",
        ScalarKind::UInt32 => "Word32",
        ScalarKind::Int64 => "Int64",
        ScalarKind::UInt64 => "Word64",
        ScalarKind::Float => "CFloat",
        ScalarKind::Double => "CDouble",
        ScalarKind::Size => "CSize",
        ScalarKind::UniChar => "CInt",
        ScalarKind::GType => "CGType",
    }
}

/// Wrap a rendered type in parentheses when application would misparse it.
pub(crate) fn paren(rendered: &str) -> String {
    if rendered.contains(' ') && !(rendered.starts_with('(') && rendered.ends_with(')')) {
        format!("({rendered})")
    } else {
        rendered.to_string()
    }
}

/// A conversion expression, tagged by how it is bound in the generated
/// `do` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// `let var = <expr>` — pure, no allocation.
    Pure(String),
    /// `var <- <expr>` — monadic, may allocate.
    Monadic(String),
}

impl Conversion {
    /// The expression itself, whichever way it binds.
    pub fn expr(&self) -> &str {
        match self {
            Conversion::Pure(e) | Conversion::Monadic(e) => e,
        }
    }

    /// Render as a `do`-block statement binding `var`.
    pub fn bind(&self, var: &str) -> String {
        match self {
            Conversion::Pure(e) => format!("let {var} = {e}"),
            Conversion::Monadic(e) => format!("{var} <- {e}"),
        }
    }
}

/// Conversion of one public input value into its native representation.
pub fn to_native(var: &str, ty: &TypeDesc, index: &ApiIndex) -> Result<Conversion> {
    let cat = classify(ty, index)?;
    Ok(match cat {
        Category::Scalar => match ty {
            TypeDesc::Scalar(ScalarKind::Boolean) => {
                Conversion::Pure(format!("(fromIntegral . fromEnum) {var}"))
            }
            TypeDesc::Scalar(ScalarKind::Float) | TypeDesc::Scalar(ScalarKind::Double) => {
                Conversion::Pure(format!("realToFrac {var}"))
            }
            TypeDesc::Scalar(ScalarKind::UniChar) => {
                Conversion::Pure(format!("(fromIntegral . ord) {var}"))
            }
            _ => Conversion::Pure(format!("fromIntegral {var}")),
        },
        Category::Enum => Conversion::Pure(format!("(fromIntegral . fromEnum) {var}")),
        Category::String => Conversion::Monadic(format!("textToCString {var}")),
        Category::Object | Category::Interface => {
            Conversion::Monadic(format!("unsafeManagedPtrCastPtr {var}"))
        }
        Category::Struct { .. } | Category::Union { .. } => {
            Conversion::Monadic(format!("unsafeManagedPtrGetPtr {var}"))
        }
        Category::Callback => Conversion::Pure(format!("castFunPtr {var}")),
        Category::FixedArray | Category::LengthArray => {
            let helper = match element_category(ty, index)? {
                Some(Category::String) => "packUTF8CArray",
                Some(Category::Object) | Some(Category::Interface) => "packPtrArray",
                _ => "packStorableArray",
            };
            Conversion::Monadic(format!("{helper} {var}"))
        }
        Category::ZeroTerminatedArray => {
            let helper = match element_category(ty, index)? {
                Some(Category::String) => "packZeroTerminatedUTF8CArray",
                Some(Category::Object) | Some(Category::Interface) => "packZeroTerminatedPtrArray",
                _ => "packZeroTerminatedStorableArray",
            };
            Conversion::Monadic(format!("{helper} {var}"))
        }
        Category::GrowableArray => Conversion::Monadic(format!("packGArray {var}")),
        Category::PointerArray => Conversion::Monadic(format!("packGPtrArray {var}")),
        Category::ByteArray => Conversion::Monadic(format!("packGByteArray {var}")),
        Category::List => Conversion::Monadic(format!("packGList {var}")),
        Category::SList => Conversion::Monadic(format!("packGSList {var}")),
        Category::HashTable => Conversion::Monadic(format!("packGHashTable {var}")),
        Category::Error => Conversion::Monadic(format!("unsafeManagedPtrGetPtr {var}")),
    })
}

fn element_category(ty: &TypeDesc, index: &ApiIndex) -> Result<Option<Category>> {
    match ty.element() {
        Some(elem) => Ok(Some(classify(elem, index)?)),
        None => Ok(None),
    }
}

/// The expression converting a native value back to its public
/// representation. `length_var` carries the companion length variable for
/// length-prefixed arrays.
pub fn from_native(
    var: &str,
    ty: &TypeDesc,
    transfer: Transfer,
    length_var: Option<&str>,
    index: &ApiIndex,
) -> Result<Conversion> {
    let cat = classify(ty, index)?;
    Ok(match cat {
        Category::Scalar => match ty {
            TypeDesc::Scalar(ScalarKind::Boolean) => Conversion::Pure(format!("(/= 0) {var}")),
            TypeDesc::Scalar(ScalarKind::Float) | TypeDesc::Scalar(ScalarKind::Double) => {
                Conversion::Pure(format!("realToFrac {var}"))
            }
            TypeDesc::Scalar(ScalarKind::UniChar) => {
                Conversion::Pure(format!("(chr . fromIntegral) {var}"))
            }
            _ => Conversion::Pure(format!("fromIntegral {var}")),
        },
        Category::Enum => Conversion::Pure(format!("(toEnum . fromIntegral) {var}")),
        Category::String => Conversion::Monadic(format!("cstringToText {var}")),
        Category::Object | Category::Interface => Conversion::Monadic(match transfer {
            Transfer::Everything => format!("wrapObject {var}"),
            _ => format!("newObject {var}"),
        }),
        Category::Struct { .. } | Category::Union { .. } => Conversion::Monadic(match transfer {
            Transfer::Everything => format!("wrapBoxed {var}"),
            _ => format!("newBoxed {var}"),
        }),
        Category::Callback => Conversion::Pure(format!("castFunPtr {var}")),
        Category::FixedArray | Category::LengthArray => {
            let len = length_var.unwrap_or("len");
            Conversion::Monadic(format!("unpackCArrayWithLength {len} {var}"))
        }
        Category::ZeroTerminatedArray => {
            Conversion::Monadic(format!("unpackZeroTerminatedCArray {var}"))
        }
        Category::GrowableArray => Conversion::Monadic(format!("unpackGArray {var}")),
        Category::PointerArray => Conversion::Monadic(format!("unpackGPtrArray {var}")),
        Category::ByteArray => Conversion::Monadic(format!("unpackGByteArray {var}")),
        Category::List => Conversion::Monadic(format!("unpackGList {var}")),
        Category::SList => Conversion::Monadic(format!("unpackGSList {var}")),
        Category::HashTable => Conversion::Monadic(format!("unpackGHashTable {var}")),
        Category::Error => Conversion::Monadic(format!("newBoxed {var}")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gir2hs_model::NamedKind;

    fn index() -> ApiIndex {
        let mut index = ApiIndex::new();
        index.register("Gtk", "Widget", NamedKind::Object).unwrap();
        index.register("Gtk", "Align", NamedKind::Enum).unwrap();
        index
    }

    #[test]
    fn public_types() {
        let index = index();
        assert_eq!(
            public_type(&TypeDesc::Scalar(ScalarKind::Boolean), &index).unwrap(),
            "Bool"
        );
        assert_eq!(
            public_type(&TypeDesc::String(StringKind::Utf8), &index).unwrap(),
            "Text"
        );
        assert_eq!(
            public_type(
                &TypeDesc::List {
                    elem: Box::new(TypeDesc::Named {
                        namespace: "Gtk".to_string(),
                        name: "Widget".to_string(),
                    })
                },
                &index
            )
            .unwrap(),
            "[Widget]"
        );
        assert_eq!(public_type(&TypeDesc::ByteArray, &index).unwrap(), "ByteString");
    }

    #[test]
    fn native_types() {
        let index = index();
        assert_eq!(
            native_type(&TypeDesc::Scalar(ScalarKind::Boolean), &index).unwrap(),
            "CInt"
        );
        assert_eq!(
            native_type(&TypeDesc::String(StringKind::Utf8), &index).unwrap(),
            "CString"
        );
        assert_eq!(
            native_type(
                &TypeDesc::Named {
                    namespace: "Gtk".to_string(),
                    name: "Widget".to_string(),
                },
                &index
            )
            .unwrap(),
            "Ptr Widget"
        );
        assert_eq!(
            native_type(
                &TypeDesc::Named {
                    namespace: "Gtk".to_string(),
                    name: "Align".to_string(),
                },
                &index
            )
            .unwrap(),
            "CUInt"
        );
        assert_eq!(
            native_type(
                &TypeDesc::ZeroTerminatedArray {
                    elem: Box::new(TypeDesc::String(StringKind::Utf8)),
                },
                &index
            )
            .unwrap(),
            "Ptr CString"
        );
        assert_eq!(
            native_type(
                &TypeDesc::List {
                    elem: Box::new(TypeDesc::Named {
                        namespace: "Gtk".to_string(),
                        name: "Widget".to_string(),
                    })
                },
                &index
            )
            .unwrap(),
            "Ptr (GList (Ptr Widget))"
        );
    }

    #[test]
    fn conversions_pick_allocation_mode() {
        let index = index();
        match to_native("x", &TypeDesc::Scalar(ScalarKind::Int32), &index).unwrap() {
            Conversion::Pure(expr) => assert_eq!(expr, "fromIntegral x"),
            Conversion::Monadic(_) => panic!("scalar conversion must not allocate"),
        }
        match to_native("s", &TypeDesc::String(StringKind::Utf8), &index).unwrap() {
            Conversion::Monadic(expr) => assert_eq!(expr, "textToCString s"),
            Conversion::Pure(_) => panic!("string conversion allocates"),
        }
    }

    #[test]
    fn from_native_respects_transfer() {
        let index = index();
        let widget = TypeDesc::Named {
            namespace: "Gtk".to_string(),
            name: "Widget".to_string(),
        };
        assert_eq!(
            from_native("r", &widget, Transfer::Everything, None, &index)
                .unwrap()
                .expr(),
            "wrapObject r"
        );
        assert_eq!(
            from_native("r", &widget, Transfer::None, None, &index)
                .unwrap()
                .expr(),
            "newObject r"
        );
    }

    #[test]
    fn length_array_unpack_uses_companion_variable() {
        let index = index();
        let arr = TypeDesc::LengthArray {
            elem: Box::new(TypeDesc::Scalar(ScalarKind::UInt8)),
            length_index: 1,
        };
        assert_eq!(
            from_native("buf", &arr, Transfer::None, Some("nBytes'"), &index)
                .unwrap()
                .expr(),
            "unpackCArrayWithLength nBytes' buf"
        );
    }
}
