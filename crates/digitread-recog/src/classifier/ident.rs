//! Nearest-neighbor identification and whole-barcode recognition

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use digitread_core::Pix;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ClassificationError, RecogResult};
use crate::hog::{HogConfig, HogExtractor};
use crate::segment::{SegmentOptions, Segmenter};

use super::types::{DigitModel, Recognition};

impl DigitModel {
    /// Classify one feature vector.
    ///
    /// Finds the `k` training vectors nearest in Euclidean distance (ties
    /// go to the lower training index) and returns the majority label.
    /// Tied votes go to the smallest label.
    ///
    /// # Errors
    ///
    /// - [`ClassificationError::EmptyModel`] if the model has no samples
    /// - [`ClassificationError::FeatureLengthMismatch`] if `features` has
    ///   the wrong length
    pub fn classify(&self, features: &[f32]) -> RecogResult<u8> {
        if self.is_empty() {
            return Err(ClassificationError::EmptyModel.into());
        }
        let nfeatures = self.nfeatures();
        if features.len() != nfeatures {
            return Err(ClassificationError::FeatureLengthMismatch {
                expected: nfeatures,
                actual: features.len(),
            }
            .into());
        }

        let mut dists: Vec<(f32, usize)> = self
            .features()
            .chunks_exact(nfeatures)
            .enumerate()
            .map(|(i, train)| (squared_distance(features, train), i))
            .collect();

        let k = self.k().min(dists.len());
        let by_distance = |a: &(f32, usize), b: &(f32, usize)| -> Ordering {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        };
        if k < dists.len() {
            dists.select_nth_unstable_by(k - 1, by_distance);
        }
        let neighbors = &dists[..k];

        let labels = self.labels();
        let mut votes = [0usize; 10];
        for &(_, i) in neighbors {
            votes[labels[i] as usize] += 1;
        }
        let mut best = 0;
        for label in 1..10 {
            if votes[label] > votes[best] {
                best = label;
            }
        }
        Ok(best as u8)
    }
}

/// Squared Euclidean distance; ranks neighbors like the true distance
#[inline]
fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Per-image recognition limits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizeOptions {
    /// Longest time one image may take; `None` is unbounded
    pub deadline: Option<Duration>,
    /// Number of digits the image must yield
    pub expected_digits: Option<usize>,
}

/// Reads the digits of barcode captures against a model
///
/// Holds no model of its own: the model is passed to every
/// [`recognize`](Self::recognize) call.
#[derive(Debug, Clone, Default)]
pub struct Recognizer {
    segmenter: Segmenter,
    extractor: HogExtractor,
    options: RecognizeOptions,
}

impl Recognizer {
    /// Create a recognizer from its parts
    pub fn new(segmenter: Segmenter, extractor: HogExtractor, options: RecognizeOptions) -> Self {
        Self {
            segmenter,
            extractor,
            options,
        }
    }

    /// Create a recognizer from option values, validating them.
    pub fn from_options(
        segment: SegmentOptions,
        hog: HogConfig,
        options: RecognizeOptions,
    ) -> RecogResult<Self> {
        segment.validate()?;
        Ok(Self::new(
            Segmenter::new(segment),
            HogExtractor::new(hog)?,
            options,
        ))
    }

    pub fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    pub fn extractor(&self) -> &HogExtractor {
        &self.extractor
    }

    pub fn options(&self) -> &RecognizeOptions {
        &self.options
    }

    /// Read the digits of one barcode capture.
    ///
    /// # Errors
    ///
    /// Configuration mismatches are reported before any image work. Then
    /// any segmentation error, [`ClassificationError::DigitCountMismatch`]
    /// when `expected_digits` is set and not met, and
    /// [`ClassificationError::Timeout`] once the deadline has passed.
    pub fn recognize(&self, pix: &Pix, model: &DigitModel) -> RecogResult<Recognition> {
        if model.config() != self.extractor.config() {
            return Err(ClassificationError::ConfigMismatch {
                model: *model.config(),
                extractor: *self.extractor.config(),
            }
            .into());
        }
        if model.is_empty() {
            return Err(ClassificationError::EmptyModel.into());
        }

        let start = Instant::now();
        let cells = self.segmenter.segment(pix)?;
        self.check_deadline(start)?;

        if let Some(expected) = self.options.expected_digits
            && cells.len() != expected
        {
            return Err(ClassificationError::DigitCountMismatch {
                expected,
                found: cells.len(),
            }
            .into());
        }

        let digits = cells
            .par_iter()
            .map(|cell| -> RecogResult<u8> {
                let features = self.extractor.extract(&cell.pix)?;
                let digit = model.classify(&features)?;
                self.check_deadline(start)?;
                Ok(digit)
            })
            .collect::<RecogResult<Vec<u8>>>()?;

        let result = Recognition {
            digits,
            cells: cells.iter().map(|c| c.bounds).collect(),
        };
        debug!(digits = %result, elapsed = ?start.elapsed(), "recognized barcode");
        Ok(result)
    }

    fn check_deadline(&self, start: Instant) -> RecogResult<()> {
        if let Some(limit) = self.options.deadline
            && start.elapsed() > limit
        {
            return Err(ClassificationError::Timeout { limit }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecogError;

    fn config() -> HogConfig {
        HogConfig {
            width: 8,
            height: 8,
            cell: 4,
            block: 2,
            orientations: 2,
        }
    }

    fn point(x: f32) -> Vec<f32> {
        let mut v = vec![0.0; 8];
        v[0] = x;
        v
    }

    fn model(k: usize, points: &[(f32, u8)]) -> DigitModel {
        let labels = points.iter().map(|p| p.1).collect();
        let features = points.iter().flat_map(|p| point(p.0)).collect();
        DigitModel::new(k, config(), labels, features).unwrap()
    }

    #[test]
    fn test_nearest_neighbor() {
        let m = model(1, &[(0.0, 4), (1.0, 7), (2.0, 9)]);
        assert_eq!(m.classify(&point(0.2)).unwrap(), 4);
        assert_eq!(m.classify(&point(0.9)).unwrap(), 7);
        assert_eq!(m.classify(&point(5.0)).unwrap(), 9);
    }

    #[test]
    fn test_majority_vote() {
        let m = model(3, &[(0.0, 2), (0.1, 5), (0.2, 5), (3.0, 2)]);
        assert_eq!(m.classify(&point(0.0)).unwrap(), 5);
    }

    #[test]
    fn test_vote_tie_goes_to_smallest_label() {
        let m = model(2, &[(0.0, 8), (0.1, 3)]);
        assert_eq!(m.classify(&point(0.05)).unwrap(), 3);
    }

    #[test]
    fn test_distance_tie_goes_to_lower_index() {
        // Both at distance 1; index 0 wins the single neighbor slot
        let m = model(1, &[(1.0, 6), (-1.0, 1)]);
        assert_eq!(m.classify(&point(0.0)).unwrap(), 6);
    }

    #[test]
    fn test_k_larger_than_model() {
        let m = model(5, &[(0.0, 1), (0.1, 1)]);
        assert_eq!(m.classify(&point(0.0)).unwrap(), 1);
    }

    #[test]
    fn test_classify_errors() {
        let m = model(1, &[(0.0, 1)]);
        assert!(matches!(
            m.classify(&[0.0; 3]),
            Err(RecogError::Classification(
                ClassificationError::FeatureLengthMismatch {
                    expected: 8,
                    actual: 3
                }
            ))
        ));

        let empty = DigitModel::new(1, config(), Vec::new(), Vec::new()).unwrap();
        assert!(matches!(
            empty.classify(&point(0.0)),
            Err(RecogError::Classification(ClassificationError::EmptyModel))
        ));
    }

    #[test]
    fn test_recognize_config_mismatch_before_image_work() {
        let m = model(1, &[(0.0, 1)]);
        let blank = Pix::from_gray_bytes(4, 4, &[255; 16]).unwrap();
        let err = Recognizer::default().recognize(&blank, &m).unwrap_err();
        assert!(matches!(
            err,
            RecogError::Classification(ClassificationError::ConfigMismatch { .. })
        ));
    }
}
