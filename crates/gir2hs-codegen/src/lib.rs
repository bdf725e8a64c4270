//! Code generation for the gir2hs binding generator.
//!
//! Turns resolved callables from the model crate into Haskell binding text
//! through a three-stage pipeline: transfer resolution (which cleanup the
//! wrapper owes, on both execution paths), marshalling planning (hidden
//! lengths, return suppression, variable names, signature shape), and
//! emission.

pub mod cleanup;
pub mod emit;
pub mod error;
pub mod haskell;
pub mod names;
pub mod plan;

pub use cleanup::{
    cleanup_on_failure, cleanup_on_success, free_primitive, CleanupAction, FreeLookup,
    FreePrimitive,
};
pub use emit::emit;
pub use error::CodegenError;
pub use plan::{plan, ArgPlan, LengthOwner, Plan, ResultShape};
