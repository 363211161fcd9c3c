//! Depth conversion and fixed-threshold binarization

use super::{Pix, PixMut, PixelDepth};
use crate::color;
use crate::error::Result;

impl Pix {
    /// Convert to an 8 bpp grayscale image.
    ///
    /// - 8 bpp: returned as a cheap clone
    /// - 32 bpp: luminance of each RGB pixel
    /// - 1 bpp: foreground (1) becomes black (0), background becomes white (255)
    pub fn convert_to_gray(&self) -> Result<Pix> {
        match self.depth() {
            PixelDepth::Bit8 => Ok(self.clone()),
            PixelDepth::Bit32 => {
                let mut pixd = PixMut::new(self.width(), self.height(), PixelDepth::Bit8)?;
                for y in 0..self.height() {
                    for x in 0..self.width() {
                        let (r, g, b) = color::extract_rgb(self.get_pixel_unchecked(x, y));
                        pixd.set_pixel_unchecked(x, y, color::luminance(r, g, b) as u32);
                    }
                }
                Ok(pixd.into())
            }
            PixelDepth::Bit1 => {
                let mut pixd = PixMut::new(self.width(), self.height(), PixelDepth::Bit8)?;
                for y in 0..self.height() {
                    for x in 0..self.width() {
                        let val = if self.get_pixel_unchecked(x, y) != 0 { 0 } else { 255 };
                        pixd.set_pixel_unchecked(x, y, val);
                    }
                }
                Ok(pixd.into())
            }
        }
    }

    /// Binarize with a fixed global threshold.
    ///
    /// Pixels with value `<= threshold` (the dark side) become foreground
    /// (1); brighter pixels become background (0). Non-gray inputs are
    /// converted to grayscale first.
    pub fn threshold_to_binary(&self, threshold: u8) -> Result<Pix> {
        let gray = self.convert_to_gray()?;
        let thresh = threshold as u32;
        let mut pixd = PixMut::new(gray.width(), gray.height(), PixelDepth::Bit1)?;
        for y in 0..gray.height() {
            for x in 0..gray.width() {
                if gray.get_pixel_unchecked(x, y) <= thresh {
                    pixd.set_pixel_unchecked(x, y, 1);
                }
            }
        }
        Ok(pixd.into())
    }

    /// Count the foreground (nonzero) pixels of a 1 bpp image.
    ///
    /// For other depths this counts nonzero pixels.
    pub fn count_foreground(&self) -> u64 {
        if self.depth() == PixelDepth::Bit1 {
            // Padding bits past the row end are never set
            return self.data().iter().map(|w| w.count_ones() as u64).sum();
        }
        let mut count = 0;
        for y in 0..self.height() {
            for x in 0..self.width() {
                if self.get_pixel_unchecked(x, y) != 0 {
                    count += 1;
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_to_binary() {
        let pix = Pix::from_gray_bytes(4, 1, &[0, 128, 129, 255]).unwrap();
        let bin = pix.threshold_to_binary(128).unwrap();
        assert_eq!(bin.depth(), PixelDepth::Bit1);
        assert_eq!(bin.get_pixel(0, 0), Some(1));
        assert_eq!(bin.get_pixel(1, 0), Some(1));
        assert_eq!(bin.get_pixel(2, 0), Some(0));
        assert_eq!(bin.get_pixel(3, 0), Some(0));
        assert_eq!(bin.count_foreground(), 2);
    }

    #[test]
    fn test_convert_rgb_to_gray() {
        let mut pix = PixMut::new(2, 1, PixelDepth::Bit32).unwrap();
        pix.set_rgb(0, 0, 255, 255, 255).unwrap();
        pix.set_rgb(1, 0, 0, 0, 0).unwrap();
        let gray = Pix::from(pix).convert_to_gray().unwrap();
        assert_eq!(gray.depth(), PixelDepth::Bit8);
        assert_eq!(gray.get_pixel(0, 0), Some(255));
        assert_eq!(gray.get_pixel(1, 0), Some(0));
    }

    #[test]
    fn test_convert_binary_to_gray() {
        let mut pix = PixMut::new(2, 1, PixelDepth::Bit1).unwrap();
        pix.set_pixel(0, 0, 1).unwrap();
        let gray = Pix::from(pix).convert_to_gray().unwrap();
        assert_eq!(gray.get_pixel(0, 0), Some(0));
        assert_eq!(gray.get_pixel(1, 0), Some(255));
    }
}
