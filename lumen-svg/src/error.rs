//! Error types for lumen-svg.

use thiserror::Error;

/// Result type alias using SvgError.
pub type SvgResult<T> = Result<T, SvgError>;

/// Errors that can occur while loading, laying out, or rendering SVG documents.
#[derive(Debug, Error)]
pub enum SvgError {
    /// Invalid bitmap or render dimensions (must be positive and finite).
    #[error("Invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Pixel storage could not be allocated for the requested size.
    #[error("Out of memory allocating a {width}x{height} bitmap")]
    OutOfMemory { width: u32, height: u32 },

    /// Externally backed pixel memory is smaller than `height * stride`.
    #[error("Buffer is not long enough: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    /// Row stride is smaller than `width * 4`.
    #[error("Invalid stride {stride} for width {width}")]
    InvalidStride { stride: usize, width: u32 },

    /// The operation requires a non-null bitmap.
    #[error("Bitmap is null")]
    NullBitmap,

    /// Markup could not be parsed.
    #[error("Failed to parse document: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Document bytes are not valid UTF-8.
    #[error("Document data is not valid UTF-8")]
    InvalidEncoding,

    /// Document data is empty.
    #[error("Document data is empty")]
    EmptyDocument,

    /// The root element is not `<svg>`.
    #[error("Unsupported root element: <{0}>")]
    UnsupportedRoot(String),

    /// Font data could not be registered.
    #[error("Failed to add font face: {0}")]
    FontLoad(String),

    /// File read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding error.
    #[error("PNG encoding error: {0}")]
    Png(String),
}

impl From<png::EncodingError> for SvgError {
    fn from(err: png::EncodingError) -> Self {
        match err {
            png::EncodingError::IoError(err) => SvgError::Io(err),
            other => SvgError::Png(other.to_string()),
        }
    }
}
