//! Typed error enum for the `grpc-openapi` library API.
//!
//! Recoverable descriptor defects (dangling references, malformed map
//! entries, unresolvable field paths) never surface here; they are logged
//! with `tracing` and replaced by a fallback.

use crate::example::ExampleError;

/// Errors produced by `grpc-openapi` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading config).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// An annotation payload does not match its extension slot.
    #[error(transparent)]
    Annotation(#[from] grpc_openapi_core::AnnotationError),

    /// A declared example or default literal does not fit its field type.
    #[error("invalid example on '{element}': {source}")]
    InvalidExample {
        /// Element carrying the literal (`pkg.Message.field`).
        element: String,
        /// Coercion failure.
        #[source]
        source: ExampleError,
    },
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;
