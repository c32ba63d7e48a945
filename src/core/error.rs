//! Error types for the binding layer

use thiserror::Error;

/// Errors surfaced to callers of the binding.
///
/// Native allocation failure is deliberately not represented here: an
/// allocation that fails twice aborts the process (see `ffi::alloc`),
/// since no operation can continue safely with a null native handle.
#[derive(Error, Debug)]
pub enum LinearError {
    /// A feature index below one was supplied.
    #[error("feature index should be at least one: {index}:{value}")]
    InvalidFeatureIndex { index: i32, value: f64 },

    /// The native library rejected the solver configuration; carries the
    /// native diagnostic text.
    #[error("invalid parameters: {0}")]
    Parameter(String),

    /// Malformed model text: unknown key or solver name, missing header
    /// field, non-numeric token or premature end of input.
    #[error("malformed model file: {0}")]
    ModelFile(String),

    /// The operation is not defined for this model, e.g. weight
    /// extraction on a model without exactly two classes.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Underlying stream or file failure, passed through unchanged.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinearError>;
