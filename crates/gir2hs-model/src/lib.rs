//! Interface-metadata model for the gir2hs binding generator.
//!
//! Consumes the `.gir.toml` projection of introspection metadata and exposes
//! the resolved shapes the codegen crate works over.
//!
//! ## Modules
//!
//! - [`types`] — native type descriptors
//! - [`registry`] — the API index resolving named types
//! - [`category`] — type classification
//! - [`callable`] — arguments, directions, transfer annotations
//! - [`declaration`] — `.gir.toml` declaration file loading and validation

pub mod callable;
pub mod category;
pub mod declaration;
pub mod error;
pub mod registry;
pub mod types;

// Re-export key types for convenience
pub use callable::{Arg, Callable, Direction, ReturnValue, Transfer};
pub use category::{classify, Category};
pub use declaration::Declaration;
pub use error::ModelError;
pub use registry::{ApiIndex, NamedKind};
pub use types::{ScalarKind, StringKind, TypeDesc};
