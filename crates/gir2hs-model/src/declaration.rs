//! Interface declaration file (`.gir.toml`) loading.
//!
//! A `.gir.toml` file is a TOML projection of introspection metadata for one
//! namespace, produced by an external lowering step: the named types the
//! namespace registers and the callables to generate bindings for. This
//! module parses the projection, builds the API index contribution, and
//! validates the invariants the planner relies on.

use serde::{Deserialize, Serialize};

use crate::callable::Callable;
use crate::error::{ModelError, Result};
use crate::registry::{ApiIndex, NamedKind};
use crate::types::TypeDesc;

/// A complete declaration parsed from a `.gir.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    /// The namespace this file describes.
    pub namespace: Namespace,
    /// Named types registered by the namespace.
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    /// Callables to generate bindings for.
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

/// Namespace metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Namespace {
    /// Namespace name (e.g. "Gtk").
    pub name: String,
    /// Introspection version string (e.g. "4.0").
    #[serde(default)]
    pub version: Option<String>,
}

/// Kind tag for a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Object,
    Interface,
    Struct,
    Union,
    Enum,
    Flags,
    Callback,
}

/// One named type registered by the namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    /// For structs and unions: whether a registered copy/free pair exists.
    #[serde(default)]
    pub boxed: bool,
}

impl TypeDecl {
    fn named_kind(&self) -> NamedKind {
        match self.kind {
            TypeKind::Object => NamedKind::Object,
            TypeKind::Interface => NamedKind::Interface,
            TypeKind::Struct => NamedKind::Struct { boxed: self.boxed },
            TypeKind::Union => NamedKind::Union { boxed: self.boxed },
            TypeKind::Enum => NamedKind::Enum,
            TypeKind::Flags => NamedKind::Flags,
            TypeKind::Callback => NamedKind::Callback,
        }
    }
}

/// One callable entry, with the declaration-only `excluded` switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    #[serde(flatten)]
    pub callable: Callable,
    /// Whether this entry is excluded from generation.
    #[serde(default)]
    pub excluded: bool,
}

impl Declaration {
    /// Parse a declaration from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        let decl: Declaration = toml::from_str(input).map_err(ModelError::Toml)?;
        if decl.namespace.name.is_empty() {
            return Err(ModelError::InvalidDeclaration {
                detail: "namespace.name is required".to_string(),
            });
        }
        Ok(decl)
    }

    /// Parse a declaration from a file path.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Return only the non-excluded callables.
    pub fn active_functions(&self) -> Vec<&Callable> {
        self.functions
            .iter()
            .filter(|f| !f.excluded)
            .map(|f| &f.callable)
            .collect()
    }

    /// Register this namespace's types into the API index.
    pub fn register_types(&self, index: &mut ApiIndex) -> Result<()> {
        for decl in &self.types {
            index.register(&self.namespace.name, &decl.name, decl.named_kind())?;
        }
        Ok(())
    }

    /// Validate the invariants the planner relies on, against a fully
    /// populated API index:
    ///
    /// - every `Named` descriptor resolves;
    /// - every length-array argument's length index names an existing,
    ///   non-array argument of the same callable.
    pub fn validate(&self, index: &ApiIndex) -> Result<()> {
        for callable in self.active_functions() {
            for arg in &callable.args {
                check_named_resolved(&arg.ty, index)?;
                check_length_target(callable, &arg.name, &arg.ty)?;
            }
            if let Some(ret) = &callable.ret {
                check_named_resolved(&ret.ty, index)?;
                check_length_target(callable, "return value", &ret.ty)?;
            }
        }
        Ok(())
    }
}

fn check_named_resolved(ty: &TypeDesc, index: &ApiIndex) -> Result<()> {
    match ty {
        TypeDesc::Named { namespace, name } => {
            index.resolve(namespace, name)?;
        }
        TypeDesc::HashTable { key, value } => {
            check_named_resolved(key, index)?;
            check_named_resolved(value, index)?;
        }
        _ => {
            if let Some(elem) = ty.element() {
                check_named_resolved(elem, index)?;
            }
        }
    }
    Ok(())
}

fn check_length_target(callable: &Callable, owner: &str, ty: &TypeDesc) -> Result<()> {
    let Some(idx) = ty.length_index() else {
        return Ok(());
    };
    let Some(target) = callable.args.get(idx) else {
        return Err(ModelError::InvalidLengthArgument {
            argument: owner.to_string(),
            detail: format!(
                "length index {idx} is out of range for '{}' ({} arguments)",
                callable.name,
                callable.args.len()
            ),
        });
    };
    if target.ty.is_array() {
        return Err(ModelError::InvalidLengthArgument {
            argument: owner.to_string(),
            detail: format!("length argument '{}' is itself array-typed", target.name),
        });
    }
    Ok(())
}
