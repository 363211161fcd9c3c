//! digitread-region - Region analysis for digitread
//!
//! This crate finds and labels connected regions of binary images. The
//! barcode segmenter uses it to locate the dominant dark region of a
//! thresholded capture.
//!
//! # Examples
//!
//! ```
//! use digitread_region::{find_connected_components, ConnectivityType};
//! use digitread_core::{PixMut, Pix, PixelDepth};
//!
//! let mut pix_mut = PixMut::new(100, 100, PixelDepth::Bit1).unwrap();
//! pix_mut.set_pixel(10, 10, 1).unwrap();
//! pix_mut.set_pixel(11, 10, 1).unwrap();
//! pix_mut.set_pixel(50, 50, 1).unwrap();
//! let pix: Pix = pix_mut.into();
//!
//! let components = find_connected_components(&pix, ConnectivityType::FourWay).unwrap();
//! assert_eq!(components.len(), 2);
//! ```

pub mod conncomp;
pub mod error;
pub mod label;

// Re-export core types
pub use digitread_core;

pub use error::{RegionError, RegionResult};

pub use conncomp::{
    ConnectedComponent, ConnectivityType, find_connected_components, label_connected_components,
};

pub use label::{largest_component, pix_count_components, pix_largest_component};
