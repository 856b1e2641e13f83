//! Error handling for MapView
//!
//! Provides the error types produced by the collaborators the map settings
//! layer delegates to:
//! - Transform errors (CRS mismatch, points outside a projection's domain)
//! - Document errors (project XML parsing)
//!
//! All error types use `thiserror` for ergonomic error handling. The map
//! settings layer never invents its own variants for these failures; it
//! propagates them unchanged.

use thiserror::Error;

/// Coordinate transform error type
///
/// Raised by [`crate::transform::CoordinateTransform`] and any plugged-in
/// [`crate::transform::CoordinateOperation`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// Source or destination CRS is not valid
    #[error("Invalid coordinate reference system: '{auth_id}'")]
    InvalidCrs {
        /// The authority id of the offending CRS (may be empty).
        auth_id: String,
    },

    /// No operation is known between the two CRSes
    #[error("No coordinate operation available from {source_crs} to {destination_crs}")]
    Unsupported {
        /// Source CRS authority id.
        source_crs: String,
        /// Destination CRS authority id.
        destination_crs: String,
    },

    /// The point lies outside the valid domain of the operation
    #[error("Point ({x}, {y}) is outside the valid domain of {crs}")]
    OutOfDomain {
        /// X coordinate of the rejected point.
        x: f64,
        /// Y coordinate of the rejected point.
        y: f64,
        /// CRS whose domain was exceeded.
        crs: String,
    },

    /// The operation produced or was given a non-finite coordinate
    #[error("Non-finite coordinate in transform")]
    NonFinite,
}

/// Project document error type
///
/// Represents errors raised while parsing a project document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The XML is not well formed
    #[error("Malformed XML at byte {position}: {reason}")]
    Xml {
        /// Byte offset reported by the parser.
        position: u64,
        /// Parser message.
        reason: String,
    },

    /// The document has no root element
    #[error("Document has no root element")]
    Empty,

    /// A required element is missing
    #[error("Missing element <{element}>")]
    MissingElement {
        /// The element name.
        element: String,
    },

    /// An element or attribute carried a value that could not be parsed
    #[error("Invalid value '{value}' for <{element}>")]
    InvalidValue {
        /// The element (or element/attribute) name.
        element: String,
        /// The raw value.
        value: String,
    },
}

/// Main error type for MapView
///
/// A unified error type that can represent any error from the core layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Transform error
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Document error
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a transform error
    pub fn is_transform_error(&self) -> bool {
        matches!(self, Error::Transform(_))
    }

    /// Check if this is a document error
    pub fn is_document_error(&self) -> bool {
        matches!(self, Error::Document(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
