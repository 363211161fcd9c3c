//! digitread-transform - Geometric transformations for digitread
//!
//! Resizing is the only transformation the recognizer needs: every digit
//! cell is brought to one canonical size before features are computed.
//!
//! - Bilinear interpolation, with pixel centers aligned between source
//!   and destination
//! - Nearest-neighbor sampling (used for binary images)

mod error;
pub mod scale;

pub use error::{TransformError, TransformResult};
pub use scale::{ScaleMethod, scale, scale_by_sampling, scale_to_size};
