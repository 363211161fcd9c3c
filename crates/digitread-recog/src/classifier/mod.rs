//! Digit classification
//!
//! A k-nearest-neighbor classifier over HOG descriptors.
//!
//! # Overview
//!
//! 1. [`train`] stores the labeled training vectors in a [`DigitModel`]
//!    and measures accuracy on a held-out partition
//! 2. The model is written to disk and read back with the
//!    `DigitModel::write_*` / `DigitModel::read_*` methods
//! 3. A [`Recognizer`] segments a barcode capture, describes every cell
//!    and classifies it against the model
//!
//! # Example
//!
//! ```no_run
//! use digitread_recog::classifier::{Recognizer, TrainOptions, train_from_corpus};
//! use digitread_recog::{HogConfig, HogExtractor, load_corpus};
//!
//! let corpus = load_corpus("corpus").unwrap();
//! let extractor = HogExtractor::new(HogConfig::default()).unwrap();
//! let report = train_from_corpus(&corpus, &extractor, &TrainOptions::default()).unwrap();
//!
//! let image = digitread_io::read_image("label.png").unwrap();
//! let result = Recognizer::default().recognize(&image, &report.model).unwrap();
//! println!("{result}");
//! ```

mod ident;
mod serial;
mod train;
mod types;

pub use ident::*;
pub use train::*;
pub use types::*;
