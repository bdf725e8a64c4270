//! Model error types.

/// Errors that can occur while loading or resolving interface metadata.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Failed to parse a `.gir.toml` declaration file.
    #[error("invalid declaration: {detail}")]
    InvalidDeclaration { detail: String },

    /// A named type was referenced but never registered in the API index.
    #[error("unknown named type: {namespace}.{name}")]
    UnknownNamedType { namespace: String, name: String },

    /// A named type was registered twice.
    #[error("duplicate type registration: {namespace}.{name}")]
    DuplicateType { namespace: String, name: String },

    /// A length-array argument points at a length argument that does not
    /// exist or cannot carry a length.
    #[error("invalid length argument for '{argument}': {detail}")]
    InvalidLengthArgument { argument: String, detail: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
