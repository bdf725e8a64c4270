//! Codegen error types.

/// Errors that abort generation of a single callable.
///
/// These are fatal for the affected callable only; the driver reports them
/// and moves on to the next entry in the batch.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The callable's bookkeeping is inconsistent (bad length index, slot
    /// missing during emission).
    #[error("cannot plan '{callable}': {detail}")]
    InvalidPlan { callable: String, detail: String },

    /// A model-level failure (usually an unresolved named type).
    #[error(transparent)]
    Model(#[from] gir2hs_model::ModelError),
}

/// Result type alias for codegen operations.
pub type Result<T> = std::result::Result<T, CodegenError>;
