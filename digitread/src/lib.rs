//! digitread - Barcode digit recognition
//!
//! Reads the human-readable digits printed under a barcode: a k-nearest
//! neighbor classifier over HOG descriptors, trained from a directory of
//! labeled digit images.
//!
//! # Overview
//!
//! - Image I/O (PNG, JPEG, PNM)
//! - Barcode region detection and digit cell segmentation
//! - HOG feature extraction
//! - k-NN training, model files and recognition
//!
//! # Example
//!
//! ```no_run
//! use digitread::recog::{DigitModel, Recognizer};
//!
//! let model = DigitModel::read_from_file("digits.dmodel").unwrap();
//! let image = digitread::io::read_image("label.png").unwrap();
//! let code = Recognizer::default().recognize(&image, &model).unwrap();
//! println!("{code}");
//! ```

// Re-export core types (primary data structures used everywhere)
pub use digitread_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use digitread_io as io;
pub use digitread_recog as recog;
pub use digitread_region as region;
pub use digitread_transform as transform;
