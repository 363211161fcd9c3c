//! Histogram of Oriented Gradients descriptor
//!
//! Turns a grayscale digit cell into a fixed-length feature vector
//! (Dalal-Triggs HOG with L2-Hys block normalization):
//!
//! 1. Resize to the canonical `width x height` (bilinear)
//! 2. Centered `[-1, 0, 1]` gradients; the outermost rows and columns get 0
//! 3. Unsigned orientation in `[0, 180)` degrees, magnitude `hypot(gx, gy)`
//! 4. One histogram of `orientations` bins per `cell x cell` pixel cell,
//!    normalized by the cell area
//! 5. Overlapping `block x block` cell blocks with a one-cell stride, each
//!    L2 normalized, clipped at 0.2 and renormalized
//!
//! The vector layout is block row, block column, cell row, cell column,
//! orientation bin (row-major).

use crate::error::{RecogError, RecogResult};
use digitread_core::{Pix, PixelDepth};
use digitread_transform::scale_to_size;
use rayon::prelude::*;

/// Side of the canonical square every cell is resized to
pub const DEFAULT_CANONICAL_SIZE: u32 = 128;
/// Pixels per HOG cell side
pub const DEFAULT_CELL_SIZE: u32 = 16;
/// Cells per block side
pub const DEFAULT_BLOCK_SIZE: u32 = 2;
/// Orientation bins over 180 degrees
pub const DEFAULT_ORIENTATIONS: u32 = 9;

/// L2-Hys clipping level
const L2HYS_CLIP: f32 = 0.2;
/// Normalization epsilon
const NORM_EPS: f32 = 1e-5;

/// A HOG descriptor
pub type FeatureVector = Vec<f32>;

/// Descriptor configuration.
///
/// Training and inference must use equal configurations; a model records
/// the one it was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HogConfig {
    /// Canonical image width
    pub width: u32,
    /// Canonical image height
    pub height: u32,
    /// Pixels per cell side
    pub cell: u32,
    /// Cells per block side
    pub block: u32,
    /// Orientation bins
    pub orientations: u32,
}

impl Default for HogConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANONICAL_SIZE,
            height: DEFAULT_CANONICAL_SIZE,
            cell: DEFAULT_CELL_SIZE,
            block: DEFAULT_BLOCK_SIZE,
            orientations: DEFAULT_ORIENTATIONS,
        }
    }
}

impl std::fmt::Display for HogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}, cell {}, block {}, {} orientations",
            self.width, self.height, self.cell, self.block, self.orientations
        )
    }
}

impl HogConfig {
    /// Number of whole cells across and down the canonical image.
    pub fn cells(&self) -> (u32, u32) {
        if self.cell == 0 {
            return (0, 0);
        }
        (self.width / self.cell, self.height / self.cell)
    }

    /// Number of block positions across and down.
    pub fn blocks(&self) -> (u32, u32) {
        let (cx, cy) = self.cells();
        if self.block == 0 || cx < self.block || cy < self.block {
            return (0, 0);
        }
        (cx - self.block + 1, cy - self.block + 1)
    }

    /// Exact length of the vectors this configuration produces.
    pub fn feature_len(&self) -> usize {
        let (bx, by) = self.blocks();
        bx as usize * by as usize * (self.block * self.block) as usize * self.orientations as usize
    }

    /// Check that the configuration yields at least one block.
    pub fn validate(&self) -> RecogResult<()> {
        if self.width == 0
            || self.height == 0
            || self.cell == 0
            || self.block == 0
            || self.orientations == 0
        {
            return Err(RecogError::InvalidParameter(format!(
                "HOG configuration has a zero value: {}",
                self
            )));
        }
        if self.orientations > 180 {
            return Err(RecogError::InvalidParameter(format!(
                "too many orientation bins: {}",
                self.orientations
            )));
        }
        if self.feature_len() == 0 {
            return Err(RecogError::InvalidParameter(format!(
                "canonical size holds fewer cells than one block: {}",
                self
            )));
        }
        Ok(())
    }
}

/// Computes HOG descriptors for one configuration.
///
/// The extractor holds no mutable state, so one instance can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct HogExtractor {
    config: HogConfig,
}

impl Default for HogExtractor {
    fn default() -> Self {
        Self {
            config: HogConfig::default(),
        }
    }
}

impl HogExtractor {
    /// Create an extractor, validating the configuration.
    pub fn new(config: HogConfig) -> RecogResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this extractor applies
    pub fn config(&self) -> &HogConfig {
        &self.config
    }

    /// Length of every vector returned by [`extract`](Self::extract).
    pub fn feature_len(&self) -> usize {
        self.config.feature_len()
    }

    /// Compute the descriptor of one image.
    ///
    /// Color and binary inputs are converted to 8 bpp gray first; inputs of
    /// any size are resized to the canonical size.
    pub fn extract(&self, pix: &Pix) -> RecogResult<FeatureVector> {
        let gray = match pix.depth() {
            PixelDepth::Bit8 => pix.clone(),
            _ => pix.convert_to_gray()?,
        };
        let canon = if gray.width() == self.config.width && gray.height() == self.config.height {
            gray
        } else {
            scale_to_size(&gray, self.config.width, self.config.height)?
        };
        Ok(self.describe(&canon))
    }

    /// Compute descriptors for many images on the rayon pool.
    ///
    /// The output order matches the input order.
    pub fn extract_batch(&self, images: &[Pix]) -> RecogResult<Vec<FeatureVector>> {
        images.par_iter().map(|pix| self.extract(pix)).collect()
    }

    /// HOG of an 8 bpp image already at the canonical size
    fn describe(&self, pix: &Pix) -> FeatureVector {
        let cfg = &self.config;
        let (w, h) = (cfg.width as usize, cfg.height as usize);
        let nbins = cfg.orientations as usize;
        let cell = cfg.cell as usize;
        let (cells_x, cells_y) = cfg.cells();
        let (cells_x, cells_y) = (cells_x as usize, cells_y as usize);

        let mut img = vec![0f32; w * h];
        for y in 0..h {
            for x in 0..w {
                img[y * w + x] = pix.get_pixel_unchecked(x as u32, y as u32) as f32;
            }
        }

        // Cell histograms
        let bin_width = 180.0 / nbins as f32;
        let mut hist = vec![0f32; cells_x * cells_y * nbins];
        for y in 0..cells_y * cell {
            for x in 0..cells_x * cell {
                let gx = if x > 0 && x + 1 < w {
                    img[y * w + x + 1] - img[y * w + x - 1]
                } else {
                    0.0
                };
                let gy = if y > 0 && y + 1 < h {
                    img[(y + 1) * w + x] - img[(y - 1) * w + x]
                } else {
                    0.0
                };
                let mag = gx.hypot(gy);
                if mag == 0.0 {
                    continue;
                }
                let angle = gy.atan2(gx).to_degrees().rem_euclid(180.0);
                let bin = ((angle / bin_width) as usize).min(nbins - 1);
                let c = (y / cell) * cells_x + x / cell;
                hist[c * nbins + bin] += mag;
            }
        }
        let area = (cell * cell) as f32;
        for v in hist.iter_mut() {
            *v /= area;
        }

        // Block normalization
        let b = cfg.block as usize;
        let (blocks_x, blocks_y) = cfg.blocks();
        let mut out = Vec::with_capacity(cfg.feature_len());
        let mut block = Vec::with_capacity(b * b * nbins);
        for by in 0..blocks_y as usize {
            for bx in 0..blocks_x as usize {
                block.clear();
                for cy in by..by + b {
                    for cx in bx..bx + b {
                        let c = cy * cells_x + cx;
                        block.extend_from_slice(&hist[c * nbins..(c + 1) * nbins]);
                    }
                }
                l2_hys(&mut block);
                out.extend_from_slice(&block);
            }
        }
        out
    }
}

/// L2 normalize, clip, renormalize
fn l2_hys(block: &mut [f32]) {
    let eps2 = NORM_EPS * NORM_EPS;
    let norm = (block.iter().map(|v| v * v).sum::<f32>() + eps2).sqrt();
    for v in block.iter_mut() {
        *v = (*v / norm).min(L2HYS_CLIP);
    }
    let norm = (block.iter().map(|v| v * v).sum::<f32>() + eps2).sqrt();
    for v in block.iter_mut() {
        *v /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digitread_core::PixMut;

    fn vertical_edge(w: u32, h: u32) -> Pix {
        let mut pix = PixMut::new(w, h, PixelDepth::Bit8).unwrap();
        for y in 0..h {
            for x in w / 2..w {
                pix.set_pixel(x, y, 200).unwrap();
            }
        }
        pix.into()
    }

    #[test]
    fn test_default_feature_len() {
        let cfg = HogConfig::default();
        assert_eq!(cfg.cells(), (8, 8));
        assert_eq!(cfg.blocks(), (7, 7));
        assert_eq!(cfg.feature_len(), 1764);
    }

    #[test]
    fn test_validate() {
        assert!(HogConfig::default().validate().is_ok());
        let zero = HogConfig {
            cell: 0,
            ..HogConfig::default()
        };
        assert!(zero.validate().is_err());
        let too_small = HogConfig {
            width: 16,
            height: 16,
            ..HogConfig::default()
        };
        assert_eq!(too_small.feature_len(), 0);
        assert!(too_small.validate().is_err());
    }

    #[test]
    fn test_output_length_for_any_input_size() {
        let hog = HogExtractor::new(HogConfig::default()).unwrap();
        for (w, h) in [(40, 64), (128, 128), (300, 20)] {
            let v = hog.extract(&vertical_edge(w, h)).unwrap();
            assert_eq!(v.len(), 1764);
        }
        let small = HogConfig {
            width: 32,
            height: 48,
            cell: 8,
            block: 2,
            orientations: 6,
        };
        let hog = HogExtractor::new(small).unwrap();
        assert_eq!(hog.extract(&vertical_edge(10, 10)).unwrap().len(), small.feature_len());
        assert_eq!(small.feature_len(), 3 * 5 * 4 * 6);
    }

    #[test]
    fn test_flat_image_is_zero() {
        let hog = HogExtractor::new(HogConfig::default()).unwrap();
        let flat = Pix::from_gray_bytes(128, 128, &vec![90u8; 128 * 128]).unwrap();
        assert!(hog.extract(&flat).unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_vertical_edge_lands_in_first_bin() {
        let cfg = HogConfig::default();
        let hog = HogExtractor::new(cfg).unwrap();
        let v = hog.extract(&vertical_edge(128, 128)).unwrap();
        // Horizontal gradient means orientation 0, i.e. bin 0
        let mut per_bin = [0f32; 9];
        for (i, &x) in v.iter().enumerate() {
            per_bin[i % 9] += x;
        }
        assert!(per_bin[0] > 0.0);
        assert!(per_bin[1..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_blocks_are_normalized_and_clipped() {
        let hog = HogExtractor::new(HogConfig::default()).unwrap();
        let v = hog.extract(&vertical_edge(128, 128)).unwrap();
        for block in v.chunks(36) {
            let norm: f32 = block.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!(norm < 1.0 + 1e-3);
            assert!(block.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
    }

    #[test]
    fn test_deterministic_and_batch_matches() {
        let hog = HogExtractor::new(HogConfig::default()).unwrap();
        let images = vec![vertical_edge(40, 64), vertical_edge(64, 40)];
        let batch = hog.extract_batch(&images).unwrap();
        assert_eq!(batch[0], hog.extract(&images[0]).unwrap());
        assert_eq!(batch[1], hog.extract(&images[1]).unwrap());
    }

    #[test]
    fn test_polarity_is_ignored() {
        let hog = HogExtractor::new(HogConfig::default()).unwrap();
        let pix = vertical_edge(128, 128);
        let mut inv = pix.to_mut();
        for y in 0..128 {
            for x in 0..128 {
                inv.set_pixel(x, y, 200 - pix.get_pixel(x, y).unwrap()).unwrap();
            }
        }
        let a = hog.extract(&pix).unwrap();
        let b = hog.extract(&inv.into()).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}
