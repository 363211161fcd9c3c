//! Barcode segmentation
//!
//! Locates the barcode region in a capture and slices it into digit
//! cells:
//!
//! 1. Binarize with a fixed global threshold (dark pixels are foreground)
//! 2. Take the foreground component with the most pixels
//! 3. Crop the grayscale image to its bounding box
//! 4. Split the crop into cells, by fixed pitch or by column gaps
//! 5. Resize every cell to the canonical cell size
//!
//! The threshold is not adaptive: captures with strongly uneven lighting
//! may lose the region or merge it with the background.

use crate::error::{ClassificationError, RecogError, RecogResult};
use digitread_core::{Box, Pix};
use digitread_region::{ConnectivityType, find_connected_components, largest_component};
use digitread_transform::scale_to_size;
use tracing::debug;

/// Binarization threshold: values at or below it are foreground
pub const DEFAULT_THRESHOLD: u8 = 128;
/// Number of digits in a code
pub const DEFAULT_DIGIT_COUNT: usize = 12;
/// Side of the square each cell is resized to
pub const DEFAULT_CELL_SIZE_PX: u32 = 128;
/// Largest accepted input, in pixels
pub const DEFAULT_MAX_PIXELS: u64 = 40_000_000;
/// Default column ink fraction at or below which a column is a gap
pub const DEFAULT_MAX_INK_RATIO: f32 = 0.02;
/// Default narrowest column run accepted as a glyph
pub const DEFAULT_MIN_GLYPH_WIDTH: u32 = 2;

/// How the barcode region is divided into cells
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentStrategy {
    /// `n` equal-width cells; the last one absorbs the remainder columns
    FixedWidth(usize),
    /// One cell per run of inked columns
    ///
    /// Cell boundaries sit halfway between neighboring runs, and the outer
    /// cells extend to the region edges.
    GapDetection {
        /// Columns whose ink fraction is at most this are gaps
        max_ink_ratio: f32,
        /// Narrower runs are treated as noise
        min_glyph_width: u32,
    },
}

impl Default for SegmentStrategy {
    fn default() -> Self {
        SegmentStrategy::FixedWidth(DEFAULT_DIGIT_COUNT)
    }
}

impl SegmentStrategy {
    /// Gap detection with the default parameters
    pub fn gaps() -> Self {
        SegmentStrategy::GapDetection {
            max_ink_ratio: DEFAULT_MAX_INK_RATIO,
            min_glyph_width: DEFAULT_MIN_GLYPH_WIDTH,
        }
    }
}

/// Segmentation options
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentOptions {
    /// Binarization threshold
    pub threshold: u8,
    /// Connectivity used to find the region
    pub connectivity: ConnectivityType,
    /// Cell splitting strategy
    pub strategy: SegmentStrategy,
    /// Width every cell is resized to
    pub cell_width: u32,
    /// Height every cell is resized to
    pub cell_height: u32,
    /// Inputs with more pixels are rejected
    pub max_pixels: u64,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            connectivity: ConnectivityType::EightWay,
            strategy: SegmentStrategy::default(),
            cell_width: DEFAULT_CELL_SIZE_PX,
            cell_height: DEFAULT_CELL_SIZE_PX,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl SegmentOptions {
    /// Check parameter ranges.
    pub fn validate(&self) -> RecogResult<()> {
        if self.cell_width == 0 || self.cell_height == 0 {
            return Err(RecogError::InvalidParameter(format!(
                "cell size must be positive: {}x{}",
                self.cell_width, self.cell_height
            )));
        }
        match self.strategy {
            SegmentStrategy::FixedWidth(0) => Err(RecogError::InvalidParameter(
                "digit count must be positive".to_string(),
            )),
            SegmentStrategy::GapDetection {
                max_ink_ratio,
                min_glyph_width,
            } => {
                if !(0.0..1.0).contains(&max_ink_ratio) {
                    return Err(RecogError::InvalidParameter(format!(
                        "max_ink_ratio must be in [0, 1): {}",
                        max_ink_ratio
                    )));
                }
                if min_glyph_width == 0 {
                    return Err(RecogError::InvalidParameter(
                        "min_glyph_width must be positive".to_string(),
                    ));
                }
                Ok(())
            }
            SegmentStrategy::FixedWidth(_) => Ok(()),
        }
    }
}

/// One slice of the barcode region
#[derive(Debug, Clone)]
pub struct DigitCell {
    /// Location in the source image
    pub bounds: Box,
    /// Cell pixels resized to the canonical cell size
    pub pix: Pix,
}

/// Splits barcode captures into digit cells
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    options: SegmentOptions,
}

impl Segmenter {
    /// Create a segmenter
    pub fn new(options: SegmentOptions) -> Self {
        Self { options }
    }

    /// The options this segmenter applies
    pub fn options(&self) -> &SegmentOptions {
        &self.options
    }

    /// Reject images beyond the pixel budget.
    pub fn check_size(&self, pix: &Pix) -> RecogResult<()> {
        if pix.pixel_count() > self.options.max_pixels {
            return Err(ClassificationError::ImageTooLarge {
                width: pix.width(),
                height: pix.height(),
                max_pixels: self.options.max_pixels,
            }
            .into());
        }
        Ok(())
    }

    /// Bounding box of the largest dark component.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::NoRegionFound`] if the binarized image has no
    /// foreground pixels.
    pub fn locate_region(&self, gray: &Pix) -> RecogResult<Box> {
        let binary = gray.threshold_to_binary(self.options.threshold)?;
        let components = find_connected_components(&binary, self.options.connectivity)?;
        let largest = largest_component(&components).ok_or(RecogError::NoRegionFound)?;
        debug!(
            components = components.len(),
            region = %largest.bounds,
            pixels = largest.pixel_count,
            "located barcode region"
        );
        Ok(largest.bounds)
    }

    /// Split a region into cell boxes, left to right.
    ///
    /// `crop` is the grayscale image clipped to `region`; only gap
    /// detection looks at it.
    pub fn split(&self, crop: &Pix, region: Box) -> RecogResult<Vec<Box>> {
        match self.options.strategy {
            SegmentStrategy::FixedWidth(n) => split_fixed(region, n),
            SegmentStrategy::GapDetection {
                max_ink_ratio,
                min_glyph_width,
            } => {
                let binary = crop.threshold_to_binary(self.options.threshold)?;
                let runs = glyph_runs(&binary, max_ink_ratio, min_glyph_width);
                if runs.is_empty() {
                    return Err(RecogError::NoRegionFound);
                }
                Ok(cells_from_runs(region, &runs))
            }
        }
    }

    /// Segment a capture into resized digit cells.
    pub fn segment(&self, pix: &Pix) -> RecogResult<Vec<DigitCell>> {
        self.options.validate()?;
        self.check_size(pix)?;
        let gray = pix.convert_to_gray()?;

        let region = self.locate_region(&gray)?;
        let crop = gray.clip_box(&region)?;
        let boxes = self.split(&crop, region)?;
        debug!(
            cells = boxes.len(),
            widths = ?boxes.iter().map(|b| b.w).collect::<Vec<_>>(),
            "split barcode region"
        );

        boxes
            .into_iter()
            .map(|bounds| -> RecogResult<DigitCell> {
                let cell = gray.clip_box(&bounds)?;
                let pix = scale_to_size(&cell, self.options.cell_width, self.options.cell_height)?;
                Ok(DigitCell { bounds, pix })
            })
            .collect()
    }
}

/// Equal-width cells; the last cell takes the remainder.
fn split_fixed(region: Box, n: usize) -> RecogResult<Vec<Box>> {
    if n == 0 {
        return Err(RecogError::InvalidParameter(
            "digit count must be positive".to_string(),
        ));
    }
    if (region.w as usize) < n {
        return Err(RecogError::RegionTooNarrow {
            width: region.w as u32,
            cells: n,
        });
    }
    let step = region.w / n as i32;
    Ok((0..n as i32)
        .map(|i| {
            let x = region.x + i * step;
            let w = if i == n as i32 - 1 {
                region.right() - x
            } else {
                step
            };
            Box::new_unchecked(x, region.y, w, region.h)
        })
        .collect())
}

/// Column ranges `[start, end)` of the glyphs in a binarized crop.
///
/// Ink is whichever polarity is in the minority inside the crop, so light
/// digits on a dark label and dark digits on a light label both work.
fn glyph_runs(binary: &Pix, max_ink_ratio: f32, min_glyph_width: u32) -> Vec<(u32, u32)> {
    let (w, h) = (binary.width(), binary.height());
    let dark = binary.count_foreground();
    let ink_is_dark = dark * 2 <= binary.pixel_count();

    let mut runs = Vec::new();
    let mut start = None;
    for x in 0..=w {
        let is_glyph = x < w && {
            let dark_in_col = (0..h)
                .filter(|&y| binary.get_pixel_unchecked(x, y) != 0)
                .count() as u32;
            let ink = if ink_is_dark { dark_in_col } else { h - dark_in_col };
            ink as f32 / h as f32 > max_ink_ratio
        };
        match (is_glyph, start) {
            (true, None) => start = Some(x),
            (false, Some(s)) => {
                if x - s >= min_glyph_width {
                    runs.push((s, x));
                }
                start = None;
            }
            _ => {}
        }
    }
    runs
}

/// Cells covering the whole region, split halfway between glyph runs.
fn cells_from_runs(region: Box, runs: &[(u32, u32)]) -> Vec<Box> {
    let mut cells = Vec::with_capacity(runs.len());
    let mut left = 0i32;
    for (i, &(_, end)) in runs.iter().enumerate() {
        let right = match runs.get(i + 1) {
            Some(&(next_start, _)) => (end as i32 + next_start as i32) / 2,
            None => region.w,
        };
        cells.push(Box::new_unchecked(
            region.x + left,
            region.y,
            right - left,
            region.h,
        ));
        left = right;
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use digitread_core::{PixMut, PixelDepth};

    #[test]
    fn test_split_fixed_remainder_in_last() {
        let region = Box::new_unchecked(5, 2, 125, 30);
        let cells = split_fixed(region, 12).unwrap();
        assert_eq!(cells.len(), 12);
        assert!(cells[..11].iter().all(|c| c.w == 10));
        assert_eq!(cells[11].w, 15);
        assert_eq!(cells[11].right(), region.right());
        assert_eq!(cells.iter().map(|c| c.w).sum::<i32>(), 125);
        assert_eq!(cells[0].x, 5);
    }

    #[test]
    fn test_split_fixed_errors() {
        let region = Box::new_unchecked(0, 0, 11, 5);
        assert!(matches!(
            split_fixed(region, 12),
            Err(RecogError::RegionTooNarrow { width: 11, cells: 12 })
        ));
        assert!(matches!(
            split_fixed(region, 0),
            Err(RecogError::InvalidParameter(_))
        ));
        assert_eq!(split_fixed(Box::new_unchecked(0, 0, 12, 5), 12).unwrap().len(), 12);
    }

    #[test]
    fn test_glyph_runs_and_cells() {
        // Light background with three dark bars: ink is dark
        let mut pix = PixMut::new(20, 4, PixelDepth::Bit1).unwrap();
        for y in 0..4 {
            for x in [2, 3, 8, 9, 10, 15] {
                pix.set_pixel(x, y, 1).unwrap();
            }
        }
        let pix: Pix = pix.into();
        let runs = glyph_runs(&pix, 0.0, 1);
        assert_eq!(runs, vec![(2, 4), (8, 11), (15, 16)]);
        assert_eq!(glyph_runs(&pix, 0.0, 2), vec![(2, 4), (8, 11)]);

        let cells = cells_from_runs(Box::new_unchecked(100, 0, 20, 4), &runs);
        let xs: Vec<(i32, i32)> = cells.iter().map(|c| (c.x, c.w)).collect();
        assert_eq!(xs, vec![(100, 6), (106, 7), (113, 7)]);
    }

    #[test]
    fn test_options_validate() {
        assert!(SegmentOptions::default().validate().is_ok());
        let bad = SegmentOptions {
            strategy: SegmentStrategy::FixedWidth(0),
            ..SegmentOptions::default()
        };
        assert!(bad.validate().is_err());
        let bad = SegmentOptions {
            strategy: SegmentStrategy::GapDetection {
                max_ink_ratio: 1.5,
                min_glyph_width: 1,
            },
            ..SegmentOptions::default()
        };
        assert!(bad.validate().is_err());
        let ok = SegmentOptions {
            strategy: SegmentStrategy::gaps(),
            ..SegmentOptions::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_blank_image_has_no_region() {
        let pix = Pix::from_gray_bytes(16, 16, &[255; 256]).unwrap();
        let seg = Segmenter::default();
        assert!(matches!(seg.segment(&pix), Err(RecogError::NoRegionFound)));
    }

    #[test]
    fn test_gaps_without_glyph_run_has_no_region() {
        // A solid dark block: the crop has no minority ink anywhere
        let mut data = vec![255u8; 60 * 20];
        for y in 5..15 {
            for x in 10..50 {
                data[y * 60 + x] = 0;
            }
        }
        let pix = Pix::from_gray_bytes(60, 20, &data).unwrap();
        let seg = Segmenter::new(SegmentOptions {
            strategy: SegmentStrategy::gaps(),
            ..SegmentOptions::default()
        });
        assert!(matches!(seg.segment(&pix), Err(RecogError::NoRegionFound)));
    }

    #[test]
    fn test_too_large_rejected_first() {
        let pix = Pix::from_gray_bytes(16, 16, &[255; 256]).unwrap();
        let seg = Segmenter::new(SegmentOptions {
            max_pixels: 100,
            ..SegmentOptions::default()
        });
        assert!(matches!(
            seg.segment(&pix),
            Err(RecogError::Classification(
                ClassificationError::ImageTooLarge { .. }
            ))
        ));
    }
}
