//! Error types for tileset synthesis

use thiserror::Error;

/// Main error type for the generator
#[derive(Debug, Error)]
pub enum Error {
    /// A caller passed a value outside an operation's domain (negative
    /// counts, malformed geodetic input, bounding-volume cardinality).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An index (accessor, node, feature table) does not resolve.
    #[error("Referential integrity error: {0}")]
    ReferentialIntegrity(String),

    /// A hierarchy whose geometric error cannot decrease toward the leaves.
    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn dangling(msg: impl Into<String>) -> Self {
        Self::ReferentialIntegrity(msg.into())
    }

    pub(crate) fn topology(msg: impl Into<String>) -> Self {
        Self::UnsupportedTopology(msg.into())
    }
}

/// Standard Result type for the generator
pub type Result<T> = std::result::Result<T, Error>;
