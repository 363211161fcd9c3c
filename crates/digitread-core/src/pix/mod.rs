//! PIX - The image container
//!
//! The `Pix` structure is the fundamental image type. It supports binary
//! (1 bpp), grayscale (8 bpp) and RGB (32 bpp) images.
//!
//! # Pixel layout
//!
//! - Image data is stored in 32-bit words
//! - Every row starts on a 32-bit boundary
//! - Pixels are packed MSB to LSB within each word
//! - For 32-bit images, color order is RGBA (red in MSB)
//! - In 1 bpp images, 1 is foreground and 0 is background
//!
//! # Ownership model
//!
//! `Pix` uses `Arc` for cheap cloning (shared ownership), which also makes
//! an image safe to read from several threads at once. To modify pixel
//! data, convert to `PixMut` via [`Pix::try_into_mut`] or [`Pix::to_mut`],
//! then convert back with `Into<Pix>`.

mod access;
mod clip;
mod convert;

pub use access::*;

use crate::error::{Error, Result};
use std::sync::Arc;

/// Pixel depth (bits per pixel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelDepth {
    /// 1-bit binary image
    Bit1 = 1,
    /// 8-bit grayscale
    Bit8 = 8,
    /// 32-bit RGB
    Bit32 = 32,
}

impl PixelDepth {
    /// Create `PixelDepth` from a raw bit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] if `bits` is not 1, 8, or 32.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            1 => Ok(PixelDepth::Bit1),
            8 => Ok(PixelDepth::Bit8),
            32 => Ok(PixelDepth::Bit32),
            _ => Err(Error::InvalidDepth(bits)),
        }
    }

    /// Get the number of bits per pixel.
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Get the maximum pixel value representable at this depth.
    pub fn max_value(self) -> u32 {
        match self {
            PixelDepth::Bit32 => u32::MAX,
            _ => (1u32 << self.bits()) - 1,
        }
    }
}

/// Image file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// Unknown format
    #[default]
    Unknown,
    /// JFIF JPEG format
    Jpeg,
    /// PNG format
    Png,
    /// PNM format (PBM / PGM / PPM)
    Pnm,
}

impl ImageFormat {
    /// Get the file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Unknown => "dat",
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Pnm => "pnm",
        }
    }

    /// Guess the format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "pnm" | "pgm" | "ppm" | "pbm" => Self::Pnm,
            _ => Self::Unknown,
        }
    }
}

/// Internal PIX data
#[derive(Debug)]
struct PixData {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Depth in bits per pixel
    depth: PixelDepth,
    /// 32-bit words per line
    wpl: u32,
    /// Input file format
    informat: ImageFormat,
    /// The image data (packed 32-bit words)
    data: Vec<u32>,
}

impl PixData {
    fn zeroed(width: u32, height: u32, depth: PixelDepth) -> Self {
        let wpl = compute_wpl(width, depth);
        Self {
            width,
            height,
            depth,
            wpl,
            informat: ImageFormat::Unknown,
            data: vec![0u32; wpl as usize * height as usize],
        }
    }
}

/// Compute words per line for given width and depth.
#[inline]
fn compute_wpl(width: u32, depth: PixelDepth) -> u32 {
    let bits_per_line = u64::from(width) * u64::from(depth.bits());
    // width is a u32, so the word count always fits
    bits_per_line.div_ceil(32) as u32
}

/// PIX - Main image container
///
/// # Examples
///
/// ```
/// use digitread_core::{Pix, PixelDepth};
///
/// // Create a new 8-bit grayscale image
/// let pix = Pix::new(640, 480, PixelDepth::Bit8).unwrap();
/// assert_eq!(pix.width(), 640);
/// assert_eq!(pix.height(), 480);
/// ```
#[derive(Debug, Clone)]
pub struct Pix {
    inner: Arc<PixData>,
}

impl Pix {
    /// Create a new PIX with the specified dimensions and depth.
    ///
    /// The image data is initialized to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Pix {
            inner: Arc::new(PixData::zeroed(width, height, depth)),
        })
    }

    /// Create an 8 bpp image from row-major gray bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for a zero dimension and
    /// [`Error::IndexOutOfBounds`] when `bytes` is shorter than `width * height`.
    pub fn from_gray_bytes(width: u32, height: u32, bytes: &[u8]) -> Result<Self> {
        let needed = width as usize * height as usize;
        if bytes.len() < needed {
            return Err(Error::IndexOutOfBounds {
                index: needed,
                len: bytes.len(),
            });
        }
        let mut pix_mut = PixMut::new(width, height, PixelDepth::Bit8)?;
        for (i, &val) in bytes[..needed].iter().enumerate() {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            pix_mut.set_pixel_unchecked(x, y, val as u32);
        }
        Ok(pix_mut.into())
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the pixel depth.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get the words per line.
    #[inline]
    pub fn wpl(&self) -> u32 {
        self.inner.wpl
    }

    /// Get the input file format.
    #[inline]
    pub fn informat(&self) -> ImageFormat {
        self.inner.informat
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get the words of a specific row.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    #[inline]
    pub fn row_data(&self, y: u32) -> &[u32] {
        let start = (y * self.inner.wpl) as usize;
        let end = start + self.inner.wpl as usize;
        &self.inner.data[start..end]
    }

    /// Number of pixels (`width * height`).
    #[inline]
    pub fn pixel_count(&self) -> u64 {
        self.inner.width as u64 * self.inner.height as u64
    }

    /// Create a new zeroed PIX with the same size and depth as the source.
    pub fn create_template(&self) -> Self {
        Pix {
            inner: Arc::new(PixData::zeroed(
                self.inner.width,
                self.inner.height,
                self.inner.depth,
            )),
        }
    }

    /// Check if two PIX have the same width, height, and depth.
    pub fn sizes_equal(&self, other: &Pix) -> bool {
        self.inner.width == other.inner.width
            && self.inner.height == other.inner.height
            && self.inner.depth == other.inner.depth
    }

    /// Try to get mutable access to the image data.
    ///
    /// Succeeds only if there is exactly one reference to the data.
    pub fn try_into_mut(self) -> std::result::Result<PixMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(data) => Ok(PixMut { inner: data }),
            Err(arc) => Err(Pix { inner: arc }),
        }
    }

    /// Create a mutable copy of this PIX.
    ///
    /// Always creates a new copy that can be modified.
    pub fn to_mut(&self) -> PixMut {
        PixMut {
            inner: PixData {
                width: self.inner.width,
                height: self.inner.height,
                depth: self.inner.depth,
                wpl: self.inner.wpl,
                informat: self.inner.informat,
                data: self.inner.data.clone(),
            },
        }
    }
}

/// Mutable PIX
///
/// Allows modification of image data. Convert back to an immutable
/// [`Pix`] using `Into<Pix>`.
#[derive(Debug)]
pub struct PixMut {
    inner: PixData,
}

impl PixMut {
    /// Create a new zeroed mutable image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32, depth: PixelDepth) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(PixMut {
            inner: PixData::zeroed(width, height, depth),
        })
    }

    /// Get the image width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the pixel depth.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get words per line.
    #[inline]
    pub fn wpl(&self) -> u32 {
        self.inner.wpl
    }

    /// Set the input file format.
    pub fn set_informat(&mut self, format: ImageFormat) {
        self.inner.informat = format;
    }

    /// Get raw access to the image data.
    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.inner.data
    }

    /// Get mutable access to the image data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u32] {
        &mut self.inner.data
    }

    /// Set every pixel to `val` (masked to the depth).
    pub fn set_all(&mut self, val: u32) {
        let (w, h) = (self.inner.width, self.inner.height);
        for y in 0..h {
            for x in 0..w {
                self.set_pixel_unchecked(x, y, val);
            }
        }
    }
}

impl From<PixMut> for Pix {
    fn from(pix_mut: PixMut) -> Self {
        Pix {
            inner: Arc::new(pix_mut.inner),
        }
    }
}
