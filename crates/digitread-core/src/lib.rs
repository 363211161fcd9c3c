//! digitread Core - Basic data structures for barcode digit reading
//!
//! This crate provides the fundamental data structures used throughout
//! the digitread workspace:
//!
//! - [`Pix`] / [`PixMut`] - The image container (immutable / mutable)
//! - [`Box`] - Rectangle regions
//!
//! Images are 1 bpp (binary masks), 8 bpp (grayscale) or 32 bpp (RGB as
//! decoded from color files, converted to grayscale before processing).

pub mod box_;
pub mod error;
pub mod pix;

pub use box_::Box;
pub use error::{Error, Result};
pub use pix::{ImageFormat, Pix, PixMut, PixelDepth};

/// Color channel helpers for 32-bit RGBA pixels.
///
/// # Pixel format
///
/// 32-bit pixels are stored as `0xRRGGBBAA` (red in MSB, alpha in LSB).
pub mod color {
    /// Shift amounts for extracting color channels
    pub const RED_SHIFT: u32 = 24;
    pub const GREEN_SHIFT: u32 = 16;
    pub const BLUE_SHIFT: u32 = 8;
    pub const ALPHA_SHIFT: u32 = 0;

    /// Compose a 32-bit RGB pixel (alpha = 255).
    #[inline]
    pub fn compose_rgb(r: u8, g: u8, b: u8) -> u32 {
        ((r as u32) << RED_SHIFT)
            | ((g as u32) << GREEN_SHIFT)
            | ((b as u32) << BLUE_SHIFT)
            | (255 << ALPHA_SHIFT)
    }

    /// Extract RGB values from a 32-bit pixel.
    #[inline]
    pub fn extract_rgb(pixel: u32) -> (u8, u8, u8) {
        (
            ((pixel >> RED_SHIFT) & 0xff) as u8,
            ((pixel >> GREEN_SHIFT) & 0xff) as u8,
            ((pixel >> BLUE_SHIFT) & 0xff) as u8,
        )
    }

    /// Luminance of an RGB triple, weighted 0.299 / 0.587 / 0.114.
    ///
    /// Computed in fixed point so the result is identical on every platform.
    #[inline]
    pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
        let y = 4899 * r as u32 + 9617 * g as u32 + 1868 * b as u32;
        ((y + 8192) >> 14).min(255) as u8
    }

}
