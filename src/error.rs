//! Error types for pagesync.

use std::io;
use thiserror::Error;

use crate::model::{Rect, Source};

/// Result type alias for pagesync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while ingesting or synchronizing regions.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A region has a zero-area or inverted rectangle.
    #[error("Invalid {side} region '{id}': degenerate rect {rect}")]
    InvalidRegion {
        /// Side the region came from
        side: Source,
        /// Region identifier
        id: String,
        /// The offending rectangle
        rect: Rect,
    },

    /// Two regions on the same side share an identifier.
    #[error("Duplicate {side} region id '{id}'")]
    DuplicateRegionId {
        /// Side the regions came from
        side: Source,
        /// The repeated identifier
        id: String,
    },

    /// A propagation template names a region that does not exist.
    #[error("Unknown {side} template region '{id}'")]
    UnknownTemplate {
        /// Side the template was looked up on
        side: Source,
        /// The missing identifier
        id: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error while rendering an export.
    #[error("Export error: {0}")]
    Export(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
