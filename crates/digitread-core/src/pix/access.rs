//! Pixel access functions
//!
//! Low-level functions for getting and setting individual pixels.
//!
//! # Pixel packing
//!
//! Pixels are packed MSB-to-LSB within each 32-bit word. For example,
//! in a 1-bit image, pixel 0 occupies bit 31 (MSB) of the first word.

use super::{Pix, PixMut, PixelDepth};
use crate::error::{Error, Result};

#[inline]
fn read_word(data: &[u32], wpl: u32, depth: PixelDepth, x: u32, y: u32) -> u32 {
    let line = &data[(y * wpl) as usize..];
    match depth {
        PixelDepth::Bit1 => get_data_bit(line, x),
        PixelDepth::Bit8 => get_data_byte(line, x),
        PixelDepth::Bit32 => line[x as usize],
    }
}

#[inline]
fn write_word(data: &mut [u32], wpl: u32, depth: PixelDepth, x: u32, y: u32, val: u32) {
    let line = &mut data[(y * wpl) as usize..];
    match depth {
        PixelDepth::Bit1 => set_data_bit(line, x, val),
        PixelDepth::Bit8 => set_data_byte(line, x, val),
        PixelDepth::Bit32 => line[x as usize] = val,
    }
}

impl Pix {
    /// Get a pixel value at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(self.get_pixel_unchecked(x, y))
    }

    /// Get a pixel value without bounds checking.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`; `x` past the row end reads a neighbor.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> u32 {
        read_word(self.data(), self.wpl(), self.depth(), x, y)
    }

    /// Get RGB values at (x, y).
    ///
    /// Only valid for 32-bit images.
    pub fn get_rgb(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if self.depth() != PixelDepth::Bit32 {
            return None;
        }
        self.get_pixel(x, y).map(crate::color::extract_rgb)
    }
}

impl PixMut {
    /// Get a pixel value at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(read_word(self.data(), self.wpl(), self.depth(), x, y))
    }

    /// Set a pixel value at (x, y).
    ///
    /// The value is masked to the image depth.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if the coordinates are outside the image.
    pub fn set_pixel(&mut self, x: u32, y: u32, val: u32) -> Result<()> {
        if x >= self.width() {
            return Err(Error::IndexOutOfBounds {
                index: x as usize,
                len: self.width() as usize,
            });
        }
        if y >= self.height() {
            return Err(Error::IndexOutOfBounds {
                index: y as usize,
                len: self.height() as usize,
            });
        }
        self.set_pixel_unchecked(x, y, val);
        Ok(())
    }

    /// Set a pixel value without bounds checking.
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, val: u32) {
        let (wpl, depth) = (self.wpl(), self.depth());
        write_word(self.data_mut(), wpl, depth, x, y, val);
    }

    /// Set RGB values at (x, y) in a 32-bit image.
    pub fn set_rgb(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) -> Result<()> {
        if self.depth() != PixelDepth::Bit32 {
            return Err(Error::UnsupportedDepth(self.depth().bits()));
        }
        self.set_pixel(x, y, crate::color::compose_rgb(r, g, b))
    }
}

// ============================================================================
// Raw line access
// ============================================================================

/// Get a 1-bit pixel from a line.
#[inline]
pub fn get_data_bit(line: &[u32], x: u32) -> u32 {
    (line[(x >> 5) as usize] >> (31 - (x & 31))) & 1
}

/// Set a 1-bit pixel in a line (nonzero `val` sets the bit).
#[inline]
pub fn set_data_bit(line: &mut [u32], x: u32, val: u32) {
    let word = &mut line[(x >> 5) as usize];
    let mask = 1u32 << (31 - (x & 31));
    if val & 1 != 0 {
        *word |= mask;
    } else {
        *word &= !mask;
    }
}

/// Get an 8-bit pixel from a line.
#[inline]
pub fn get_data_byte(line: &[u32], x: u32) -> u32 {
    (line[(x >> 2) as usize] >> (8 * (3 - (x & 3)))) & 0xff
}

/// Set an 8-bit pixel in a line.
#[inline]
pub fn set_data_byte(line: &mut [u32], x: u32, val: u32) {
    let word = &mut line[(x >> 2) as usize];
    let shift = 8 * (3 - (x & 3));
    *word = (*word & !(0xff << shift)) | ((val & 0xff) << shift);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_access() {
        let mut line = vec![0u32; 2];
        set_data_bit(&mut line, 0, 1);
        set_data_bit(&mut line, 33, 1);
        assert_eq!(line[0], 0x8000_0000);
        assert_eq!(get_data_bit(&line, 33), 1);
        set_data_bit(&mut line, 33, 0);
        assert_eq!(line[1], 0);
    }

    #[test]
    fn test_byte_access() {
        let mut line = vec![0u32; 1];
        set_data_byte(&mut line, 0, 0xab);
        set_data_byte(&mut line, 3, 0x1cd);
        assert_eq!(line[0], 0xab00_00cd);
        assert_eq!(get_data_byte(&line, 0), 0xab);
        assert_eq!(get_data_byte(&line, 3), 0xcd);
    }

    #[test]
    fn test_pixel_roundtrip_all_depths() {
        for depth in [PixelDepth::Bit1, PixelDepth::Bit8, PixelDepth::Bit32] {
            let mut pix = PixMut::new(37, 5, depth).unwrap();
            let val = depth.max_value();
            pix.set_pixel(36, 4, val).unwrap();
            assert_eq!(pix.get_pixel(36, 4), Some(val));
            assert_eq!(pix.get_pixel(35, 4), Some(0));
            let pix: Pix = pix.into();
            assert_eq!(pix.get_pixel(36, 4), Some(val));
            assert_eq!(pix.get_pixel(37, 4), None);
        }
    }

    #[test]
    fn test_set_pixel_out_of_bounds() {
        let mut pix = PixMut::new(4, 4, PixelDepth::Bit8).unwrap();
        assert!(pix.set_pixel(4, 0, 1).is_err());
        assert!(pix.set_pixel(0, 4, 1).is_err());
    }

    #[test]
    fn test_rgb_access() {
        let mut pix = PixMut::new(2, 2, PixelDepth::Bit32).unwrap();
        pix.set_rgb(1, 1, 10, 20, 30).unwrap();
        let pix: Pix = pix.into();
        assert_eq!(pix.get_rgb(1, 1), Some((10, 20, 30)));

        let mut gray = PixMut::new(2, 2, PixelDepth::Bit8).unwrap();
        assert!(gray.set_rgb(0, 0, 1, 2, 3).is_err());
    }
}
