//! k-NN training with a held-out accuracy measurement

use crate::corpus::Corpus;
use crate::error::{RecogError, RecogResult};
use crate::hog::{FeatureVector, HogConfig, HogExtractor};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::prelude::*;
use tracing::info;

use super::types::{DigitModel, TrainOptions, TrainReport};

/// Fit a model on labeled feature vectors.
///
/// The sample indices are shuffled with `options.seed`; the first
/// `ceil(n * test_ratio)` are held out and the rest are stored in the
/// model. Accuracy on the held-out partition is reported only, it never
/// rejects a model.
///
/// # Errors
///
/// - [`RecogError::InvalidParameter`] for `k == 0`, a `test_ratio` outside
///   `[0, 1)`, a non-digit label, or a vector whose length differs from
///   `config.feature_len()`
/// - [`RecogError::InsufficientData`] if fewer than `k` samples exist or
///   fewer than `k` remain after the split
pub fn train(
    samples: &[(FeatureVector, u8)],
    config: &HogConfig,
    options: &TrainOptions,
) -> RecogResult<TrainReport> {
    validate_options(options)?;
    config.validate()?;

    let n = samples.len();
    if n < options.k {
        return Err(RecogError::InsufficientData {
            k: options.k,
            available: n,
        });
    }
    let nfeatures = config.feature_len();
    if let Some((v, _)) = samples.iter().find(|(v, _)| v.len() != nfeatures) {
        return Err(RecogError::InvalidParameter(format!(
            "feature vector of length {} does not match configuration length {}",
            v.len(),
            nfeatures
        )));
    }

    let test_count = held_out_count(n, options.test_ratio);
    let train_count = n - test_count;
    if train_count < options.k {
        return Err(RecogError::InsufficientData {
            k: options.k,
            available: train_count,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(options.seed);
    order.shuffle(&mut rng);
    let (held_out, kept) = order.split_at(test_count);

    let mut labels = Vec::with_capacity(train_count);
    let mut features = Vec::with_capacity(train_count * nfeatures);
    for &i in kept {
        let (v, label) = &samples[i];
        labels.push(*label);
        features.extend_from_slice(v);
    }
    let model = DigitModel::new(options.k, *config, labels, features)?;

    let accuracy = if held_out.is_empty() {
        None
    } else {
        let correct = held_out
            .par_iter()
            .map(|&i| {
                let (v, label) = &samples[i];
                model.classify(v).map(|predicted| usize::from(predicted == *label))
            })
            .sum::<RecogResult<usize>>()?;
        Some(correct as f64 / held_out.len() as f64)
    };

    match accuracy {
        Some(acc) => info!(
            train = train_count,
            test = test_count,
            k = options.k,
            "trained digit model, held-out accuracy {:.4}",
            acc
        ),
        None => info!(
            train = train_count,
            k = options.k,
            "trained digit model without a held-out partition"
        ),
    }

    Ok(TrainReport {
        model,
        accuracy,
        train_count,
        test_count,
    })
}

/// Describe every corpus sample in parallel, then [`train`].
pub fn train_from_corpus(
    corpus: &Corpus,
    extractor: &HogExtractor,
    options: &TrainOptions,
) -> RecogResult<TrainReport> {
    let features = extractor.extract_batch(&corpus.images())?;
    let samples: Vec<(FeatureVector, u8)> = features.into_iter().zip(corpus.labels()).collect();
    train(&samples, extractor.config(), options)
}

/// `ceil(n * ratio)`, ignoring floating-point noise in the product
fn held_out_count(n: usize, ratio: f64) -> usize {
    let exact = n as f64 * ratio;
    let count = (exact - 1e-9).ceil().max(0.0) as usize;
    count.min(n)
}

fn validate_options(options: &TrainOptions) -> RecogResult<()> {
    if options.k == 0 {
        return Err(RecogError::InvalidParameter("k must be positive".to_string()));
    }
    if !(0.0..1.0).contains(&options.test_ratio) {
        return Err(RecogError::InvalidParameter(format!(
            "test_ratio must be in [0, 1): {}",
            options.test_ratio
        )));
    }
    Ok(())
}
