//! Error taxonomy shared by the document, rule, export and config layers.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the core modules.
pub type Result<T, E = VariationError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum VariationError {
    /// A rule pattern has an unknown kind or a body that does not compile.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// An address no longer points at a layer of the live document.
    #[error("cannot resolve layer address `{address}`: {reason}")]
    AddressResolution { address: String, reason: String },

    /// A combination bitmask does not fit the linked modifier list.
    #[error("invalid bitmask `{bitmask}` for {expected} linked modifier(s)")]
    InvalidBitmask { bitmask: String, expected: usize },

    /// A mutation would leave a variation pointing at a missing modifier.
    #[error("{0}")]
    ReferentialIntegrity(String),

    #[error("{context} `{}`: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document engine failed to decode or flatten.
    #[error("document error: {0}")]
    Document(String),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("no document is loaded")]
    NoDocument,

    /// The document is held by a running load, render or export.
    #[error("the document is busy")]
    Busy,

    /// An interactive apply that does not fit the current selection.
    #[error("{0}")]
    Selection(&'static str),

    #[error("export cancelled")]
    Cancelled,
}

impl VariationError {
    pub fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.into(),
            source,
        }
    }

    pub fn address(address: impl ToString, reason: impl Into<String>) -> Self {
        Self::AddressResolution {
            address: address.to_string(),
            reason: reason.into(),
        }
    }
}
