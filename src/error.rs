use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while reading, transforming, slicing or rebuilding volumes.
#[derive(Debug, Error)]
pub enum Error {
    /// The path does not end with a recognized format suffix
    #[error("Unsupported format: {path:?}")]
    UnsupportedFormat { path: PathBuf },

    /// The slice index could not be recovered from the file name
    #[error("Malformed slice name: {path:?}")]
    MalformedSliceName { path: PathBuf },

    /// The slice file name carries another volume's stem
    #[error("Slice {path:?} does not belong to volume {stem:?}")]
    StemMismatch { path: PathBuf, stem: String },

    #[error("Slice {path:?} has index {index} but the volume has depth {depth}")]
    SliceIndexOutOfRange {
        path: PathBuf,
        index: usize,
        depth: usize,
    },

    #[error("Slice {path:?} repeats index {index}")]
    DuplicateSliceIndex { path: PathBuf, index: usize },

    /// Gzip layering failed; the destination was left untouched
    #[error("Compression of {path:?} failed: {source}")]
    PartialCompressionFailure {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// Contrast adjustment needs at least one nonzero element
    #[error("No nonzero elements to compute percentiles from")]
    EmptyForeground,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Invalid {format} header: {reason}")]
    InvalidHeader {
        format: &'static str,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("NIfTI error: {0}")]
    Nifti(#[from] nifti::error::NiftiError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_header(format: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidHeader {
            format,
            reason: reason.into(),
        }
    }
}
