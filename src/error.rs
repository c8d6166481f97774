//! Custom error types and result handling for comicpack operations.
//!
//! All fallible operations return a [`Result<T>`] which is a type alias for
//! `std::result::Result<T, Error>`. The orchestration entry points in
//! [`crate::packer`] never surface these as `Err`; they log them and collect
//! them into [`crate::types::PackResult::errors`] instead.
//!
use std::path::PathBuf;

/// Type alias for Results with comicpack errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all comicpack operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Malformed metadata sidecar
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Blocking task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    PackerBuilder(#[from] crate::packer::PackerBuilderError),
    /// The metadata sidecar is absent or could not be parsed.
    #[error("Metadata unavailable at '{path:?}': {reason}")]
    MissingMetadata { path: PathBuf, reason: String },
    /// A chapter directory without a single recognized image.
    #[error("Chapter directory '{0:?}' contains no images")]
    EmptyChapter(PathBuf),
    /// An album without a single recognized image anywhere beneath it.
    #[error("No images found under '{0:?}'")]
    NoImagesFound(PathBuf),
    /// Writing one archive failed; the partial file has been removed.
    #[error("Failed to write archive '{path:?}': {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    /// Every directory resolution strategy came up empty.
    #[error("Could not locate album '{id}' under '{source_dir:?}'")]
    AlbumDirNotFound { id: String, source_dir: PathBuf },
    /// Error for unsupported operations or formats (e.g., unknown image extension)
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Error for resources that couldn't be found (e.g., album directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
