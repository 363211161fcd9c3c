//! Error types for digitread-recog

use crate::hog::HogConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while classifying digits with a trained model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassificationError {
    /// The extractor computes descriptors the model was not trained on
    #[error("descriptor configuration mismatch: model uses [{model}], extractor uses [{extractor}]")]
    ConfigMismatch {
        model: HogConfig,
        extractor: HogConfig,
    },

    /// A raw feature vector has the wrong length for the model
    #[error("feature length mismatch: expected {expected}, got {actual}")]
    FeatureLengthMismatch { expected: usize, actual: usize },

    /// The model holds no training samples
    #[error("model has no training samples")]
    EmptyModel,

    /// No model has been installed yet
    #[error("no model has been trained or loaded")]
    Untrained,

    /// Recognition of one image took longer than allowed
    #[error("recognition exceeded its deadline of {limit:?}")]
    Timeout { limit: Duration },

    /// The input image is larger than the configured pixel budget
    #[error("image of {width}x{height} exceeds the limit of {max_pixels} pixels")]
    ImageTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    /// The digit string does not fit in a `u64`
    #[error("{digits} digits do not fit in a 64-bit value")]
    Overflow { digits: usize },

    /// Gap detection found a different number of glyphs than expected
    #[error("expected {expected} digits, found {found}")]
    DigitCountMismatch { expected: usize, found: usize },
}

/// Errors that can occur during training and recognition
#[derive(Debug, Error)]
pub enum RecogError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] digitread_core::Error),

    /// Image decoding or encoding error
    #[error("image error: {0}")]
    Image(#[from] digitread_io::IoError),

    /// Region analysis error
    #[error("region error: {0}")]
    Region(#[from] digitread_region::RegionError),

    /// Transform library error
    #[error("transform error: {0}")]
    Transform(#[from] digitread_transform::TransformError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameter provided
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The training directory yielded no usable samples
    #[error("no training samples found in {}", dir.display())]
    EmptyCorpus { dir: PathBuf },

    /// Fewer samples than the classifier needs
    #[error("insufficient training data: k = {k} but only {available} samples available")]
    InsufficientData { k: usize, available: usize },

    /// The binarized image has no foreground region
    #[error("no barcode region found")]
    NoRegionFound,

    /// The detected region is narrower than the number of cells
    #[error("region of width {width} is too narrow for {cells} cells")]
    RegionTooNarrow { width: u32, cells: usize },

    /// A model artifact could not be read back
    #[error("corrupt model '{path}': {reason}")]
    CorruptModel { path: String, reason: String },

    /// Classification failed
    #[error("classification error: {0}")]
    Classification(#[from] ClassificationError),
}

/// Result type for recognition operations
pub type RecogResult<T> = Result<T, RecogError>;
