//! Rectangle clipping operations for images
//!
//! Functions for extracting rectangular sub-regions from images.

use super::{Pix, PixMut};
use crate::Box;
use crate::error::{Error, Result};

impl Pix {
    /// Extract a rectangular sub-region from the image.
    ///
    /// Creates a new image containing the specified rectangle. If the
    /// rectangle extends beyond the image bounds, it is clipped to the
    /// valid region. Returns an error if the rectangle is entirely outside
    /// the image.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The requested width or height is 0
    /// - The rectangle origin is outside the image bounds
    ///
    /// # Examples
    ///
    /// ```
    /// use digitread_core::{Pix, PixelDepth};
    ///
    /// let pix = Pix::new(100, 80, PixelDepth::Bit8).unwrap();
    /// let clipped = pix.clip_rectangle(80, 60, 50, 50).unwrap();
    /// assert_eq!(clipped.width(), 20);   // clipped: 100 - 80
    /// assert_eq!(clipped.height(), 20);  // clipped: 80 - 60
    /// ```
    pub fn clip_rectangle(&self, x: u32, y: u32, w: u32, h: u32) -> Result<Pix> {
        if w == 0 || h == 0 {
            return Err(Error::InvalidParameter(format!(
                "clip rectangle has zero dimension: {}x{}",
                w, h
            )));
        }

        let src_w = self.width();
        let src_h = self.height();

        if x >= src_w || y >= src_h {
            return Err(Error::InvalidParameter(format!(
                "clip rectangle origin ({}, {}) is outside image bounds ({}x{})",
                x, y, src_w, src_h
            )));
        }

        let clip_w = w.min(src_w - x);
        let clip_h = h.min(src_h - y);

        let mut pixd = PixMut::new(clip_w, clip_h, self.depth())?;
        for dy in 0..clip_h {
            for dx in 0..clip_w {
                let val = self.get_pixel_unchecked(x + dx, y + dy);
                pixd.set_pixel_unchecked(dx, dy, val);
            }
        }

        Ok(pixd.into())
    }

    /// Extract the region covered by `region`, clipped to the image.
    ///
    /// # Errors
    ///
    /// Returns an error if the box does not intersect the image.
    pub fn clip_box(&self, region: &Box) -> Result<Pix> {
        let clipped = region
            .clip(self.width() as i32, self.height() as i32)
            .ok_or_else(|| {
                Error::InvalidParameter(format!("region {region} does not intersect image"))
            })?;
        self.clip_rectangle(
            clipped.x as u32,
            clipped.y as u32,
            clipped.w as u32,
            clipped.h as u32,
        )
    }
}
