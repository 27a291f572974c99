//! Error types for documentation merging.

use thiserror::Error;

/// Errors from parsing or merging documentation blobs.
#[derive(Debug, Error)]
pub enum SwaggerError {
    /// A blob handed to the joiner is not a valid documentation document.
    #[error("failed to parse documentation blob #{index}: {source}")]
    Parse {
        /// Zero-based position of the blob in append order.
        index: usize,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The merged document could not be serialized.
    #[error("failed to serialize merged documentation: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Result type for documentation operations.
pub type SwaggerResult<T> = Result<T, SwaggerError>;
