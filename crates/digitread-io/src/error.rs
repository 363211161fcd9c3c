//! Error types for digitread-io

use thiserror::Error;

/// Errors raised while decoding or encoding digit and barcode images
#[derive(Error, Debug)]
pub enum IoError {
    /// The file could not be opened, read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Magic bytes of no readable format, or a format this build cannot write
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Header fields that cannot describe an image
    #[error("invalid image data: {0}")]
    InvalidData(String),

    /// The PNG, JPEG or PNM decoder gave up
    #[error("decode error: {0}")]
    DecodeError(String),

    /// The PNG or PNM encoder gave up
    #[error("encode error: {0}")]
    EncodeError(String),

    /// Allocating the decoded image failed
    #[error("core error: {0}")]
    Core(#[from] digitread_core::Error),
}

/// Result type for image I/O
pub type IoResult<T> = Result<T, IoError>;
