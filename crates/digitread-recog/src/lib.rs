//! digitread-recog - Barcode digit training and recognition
//!
//! This crate reads the printed digits under a barcode:
//!
//! - **Corpus loading**: labeled single-digit images from a directory
//! - **Feature extraction**: HOG descriptors of canonical-size cells
//! - **Training**: a k-nearest-neighbor model with held-out accuracy
//! - **Model store**: a checksummed, self-describing model file
//! - **Segmentation**: locating the barcode region and slicing it into cells
//! - **Recognition**: classifying every cell and assembling the code
//!
//! # Quick Start
//!
//! ```no_run
//! use digitread_recog::{HogConfig, RecognizerOptions, TrainOptions};
//!
//! let report = digitread_recog::train_to_file(
//!     "corpus",
//!     &TrainOptions::default(),
//!     &HogConfig::default(),
//!     "digits.dmodel",
//! )
//! .unwrap();
//! println!("held-out accuracy: {:?}", report.accuracy);
//!
//! let code = digitread_recog::recognize_file(
//!     "label.png",
//!     "digits.dmodel",
//!     &RecognizerOptions::default(),
//! )
//! .unwrap();
//! println!("{code}");
//! ```
//!
//! # Modules
//!
//! - [`corpus`]: Training corpus loader
//! - [`hog`]: HOG feature extractor
//! - [`classifier`]: Trainer, model store and recognizer
//! - [`segment`]: Barcode segmenter
//! - [`active`]: Replaceable in-service model

pub mod active;
pub mod classifier;
pub mod corpus;
mod error;
pub mod hog;
pub mod segment;

use std::path::Path;

pub use error::{ClassificationError, RecogError, RecogResult};

// Re-export commonly used types
pub use active::{ActiveModel, ModelState};
pub use classifier::{
    DEFAULT_K, DEFAULT_SEED, DEFAULT_TEST_RATIO, DigitModel, RecognizeOptions, Recognition,
    Recognizer, TrainOptions, TrainReport, train, train_from_corpus,
};
pub use corpus::{Corpus, SkippedFile, TrainingSample, load_corpus, parse_label};
pub use hog::{
    DEFAULT_BLOCK_SIZE, DEFAULT_CANONICAL_SIZE, DEFAULT_CELL_SIZE, DEFAULT_ORIENTATIONS,
    FeatureVector, HogConfig, HogExtractor,
};
pub use segment::{
    DEFAULT_DIGIT_COUNT, DEFAULT_MAX_PIXELS, DEFAULT_THRESHOLD, DigitCell, SegmentOptions,
    SegmentStrategy, Segmenter,
};

// Re-export core for convenience
pub use digitread_core;

/// Every option that shapes recognition
///
/// `hog` must equal the configuration the model was trained with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognizerOptions {
    pub segment: SegmentOptions,
    pub hog: HogConfig,
    pub recognize: RecognizeOptions,
}

impl RecognizerOptions {
    /// Build the recognizer these options describe.
    pub fn build(&self) -> RecogResult<Recognizer> {
        Recognizer::from_options(self.segment.clone(), self.hog, self.recognize.clone())
    }
}

/// Load a corpus, train a model on it and save the model.
pub fn train_to_file(
    corpus_dir: impl AsRef<Path>,
    options: &TrainOptions,
    hog: &HogConfig,
    model_path: impl AsRef<Path>,
) -> RecogResult<TrainReport> {
    let corpus = load_corpus(corpus_dir)?;
    let extractor = HogExtractor::new(*hog)?;
    let report = train_from_corpus(&corpus, &extractor, options)?;
    report.model.write_to_file(model_path)?;
    Ok(report)
}

/// Read one barcode image with the model stored at `model_path`.
pub fn recognize_file(
    image: impl AsRef<Path>,
    model_path: impl AsRef<Path>,
    options: &RecognizerOptions,
) -> RecogResult<Recognition> {
    let recognizer = options.build()?;
    let model = DigitModel::read_from_file(model_path)?;
    let pix = digitread_io::read_image(image)?;
    recognizer.recognize(&pix, &model)
}
