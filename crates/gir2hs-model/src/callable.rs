//! Callable descriptors: arguments, directions, transfer annotations.

use serde::{Deserialize, Serialize};

use crate::types::TypeDesc;

/// Which way a value crosses the language boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Caller-supplied input.
    In,
    /// Callee-filled output; the wrapper allocates the buffer.
    Out,
    /// Both: caller supplies an initial value, callee may replace it.
    InOut,
}

impl Direction {
    /// Whether the caller supplies a value.
    pub fn is_in(&self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    /// Whether the callee produces a value.
    pub fn is_out(&self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }

    fn default_in() -> Self {
        Direction::In
    }
}

/// Memory-ownership transfer annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transfer {
    /// The callee only borrows; the wrapper frees its transient copy.
    None,
    /// The receiver owns the container shell but not the elements.
    Container,
    /// Full ownership passes; the wrapper frees nothing.
    Everything,
}

impl Transfer {
    fn default_none() -> Self {
        Transfer::None
    }
}

impl std::fmt::Display for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transfer::None => write!(f, "none"),
            Transfer::Container => write!(f, "container"),
            Transfer::Everything => write!(f, "everything"),
        }
    }
}

/// One argument of a callable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDesc,
    #[serde(default = "Direction::default_in")]
    pub direction: Direction,
    #[serde(default = "Transfer::default_none")]
    pub transfer: Transfer,
    #[serde(default)]
    pub nullable: bool,
}

/// The return value of a callable, when it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnValue {
    #[serde(rename = "type")]
    pub ty: TypeDesc,
    #[serde(default = "Transfer::default_none")]
    pub transfer: Transfer,
    #[serde(default)]
    pub nullable: bool,
}

/// A function, method, signal handler, or callback to generate a binding
/// for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callable {
    /// Public name of the binding.
    pub name: String,
    /// The C symbol to import.
    pub symbol: String,
    #[serde(default)]
    pub args: Vec<Arg>,
    /// `None` models a void return.
    #[serde(default, rename = "return")]
    pub ret: Option<ReturnValue>,
    /// Whether the native call takes a trailing error-out slot and may
    /// raise.
    #[serde(default)]
    pub throws: bool,
    /// Explicit request to drop the return value from the public surface.
    #[serde(default, rename = "skip-return")]
    pub skip_return: bool,
}
