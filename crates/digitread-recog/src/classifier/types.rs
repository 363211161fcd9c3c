//! Type definitions for digit classification

use crate::error::{ClassificationError, RecogError, RecogResult};
use crate::hog::HogConfig;
use digitread_core::Box as PixBox;

/// Default number of neighbors consulted per vote
pub const DEFAULT_K: usize = 3;
/// Default fraction of samples held out for accuracy measurement
pub const DEFAULT_TEST_RATIO: f64 = 0.2;
/// Default seed of the train/test shuffle
pub const DEFAULT_SEED: u64 = 42;

/// Number of decimal digits that always fit in a `u64`
const MAX_VALUE_DIGITS: usize = 19;

/// Trained k-nearest-neighbor digit model
///
/// Holds every training vector with its label. Immutable once built;
/// retraining produces a new model.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitModel {
    k: usize,
    config: HogConfig,
    labels: Vec<u8>,
    /// Training vectors, concatenated in sample order
    features: Vec<f32>,
}

impl DigitModel {
    /// Build a model from labels and concatenated feature vectors.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::InvalidParameter`] if `k` is 0, a label is not
    /// a digit, or `features` does not hold exactly one vector of
    /// `config.feature_len()` values per label.
    pub fn new(k: usize, config: HogConfig, labels: Vec<u8>, features: Vec<f32>) -> RecogResult<Self> {
        if k == 0 {
            return Err(RecogError::InvalidParameter("k must be positive".to_string()));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l > 9) {
            return Err(RecogError::InvalidParameter(format!(
                "label {} is not a digit",
                bad
            )));
        }
        let nfeatures = config.feature_len();
        if features.len() != labels.len() * nfeatures {
            return Err(RecogError::InvalidParameter(format!(
                "{} feature values for {} samples of length {}",
                features.len(),
                labels.len(),
                nfeatures
            )));
        }
        Ok(Self {
            k,
            config,
            labels,
            features,
        })
    }

    /// Neighbors consulted per vote
    pub fn k(&self) -> usize {
        self.k
    }

    /// Descriptor configuration the training vectors were computed with
    pub fn config(&self) -> &HogConfig {
        &self.config
    }

    /// Number of training samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if the model holds no samples
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Length of every feature vector
    pub fn nfeatures(&self) -> usize {
        self.config.feature_len()
    }

    /// Training labels in sample order
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// All training vectors, concatenated
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// Training vector of sample `index`
    pub fn feature(&self, index: usize) -> Option<&[f32]> {
        let n = self.nfeatures();
        self.features.get(index * n..(index + 1) * n)
    }

    /// Number of training samples per digit
    pub fn label_counts(&self) -> [usize; 10] {
        let mut counts = [0; 10];
        for &label in &self.labels {
            counts[label as usize] += 1;
        }
        counts
    }
}

/// Digits read from one barcode image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    /// Digits, most significant first
    pub digits: Vec<u8>,
    /// Cell each digit was read from, in source coordinates
    pub cells: Vec<PixBox>,
}

impl Recognition {
    /// Number of digits
    pub fn len(&self) -> usize {
        self.digits.len()
    }

    /// True if nothing was read
    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// Decimal value of the digits, most significant first.
    ///
    /// Leading zeros are dropped by the conversion; use the `Display`
    /// output to keep them.
    ///
    /// # Errors
    ///
    /// Returns [`ClassificationError::Overflow`] for more than 19 digits.
    pub fn value(&self) -> RecogResult<u64> {
        if self.digits.len() > MAX_VALUE_DIGITS {
            return Err(ClassificationError::Overflow {
                digits: self.digits.len(),
            }
            .into());
        }
        Ok(self
            .digits
            .iter()
            .fold(0u64, |acc, &d| acc * 10 + d as u64))
    }
}

impl std::fmt::Display for Recognition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &d in &self.digits {
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

/// Training parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TrainOptions {
    /// Fraction of samples held out for accuracy measurement, in `[0, 1)`
    pub test_ratio: f64,
    /// Neighbors consulted per vote
    pub k: usize,
    /// Seed of the train/test shuffle
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_ratio: DEFAULT_TEST_RATIO,
            k: DEFAULT_K,
            seed: DEFAULT_SEED,
        }
    }
}

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// The fitted model
    pub model: DigitModel,
    /// Held-out accuracy; `None` when nothing was held out
    pub accuracy: Option<f64>,
    /// Samples stored in the model
    pub train_count: usize,
    /// Samples used to measure accuracy
    pub test_count: usize,
}
