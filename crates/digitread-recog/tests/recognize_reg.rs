//! Barcode recognition regression test
//!
//! Composes barcode strips from the synthetic font and reads them back
//! with a model trained on the same font.
//!
//! Run with:
//! ```
//! cargo test -p digitread-recog --test recognize_reg
//! ```

use std::time::Duration;

use digitread_core::{ImageFormat, Pix};
use digitread_recog::{
    ActiveModel, ClassificationError, DigitModel, FeatureVector, HogConfig, HogExtractor,
    ModelState, RecogError, RecognizeOptions, Recognizer, RecognizerOptions, SegmentOptions,
    SegmentStrategy, Segmenter, TrainOptions, recognize_file, train,
};
use digitread_test::synth::{CellStyle, compose_strip, render_cell};
use digitread_test::{RegParams, scratch_dir};

const CODE: &str = "012345678901";

fn samples(extractor: &HogExtractor, per_digit: usize) -> Vec<(FeatureVector, u8)> {
    let mut out = Vec::with_capacity(per_digit * 10);
    for digit in 0..10u8 {
        for i in 0..per_digit {
            let cell = render_cell(digit, &CellStyle::variant(i)).unwrap();
            out.push((extractor.extract(&cell).unwrap(), digit));
        }
    }
    out
}

fn trained_model(config: HogConfig) -> DigitModel {
    let extractor = HogExtractor::new(config).unwrap();
    train(&samples(&extractor, 30), &config, &TrainOptions::default())
        .unwrap()
        .model
}

#[test]
fn recognize_reg() {
    let mut rp = RegParams::new("recognize");
    let model = trained_model(HogConfig::default());
    let strip = compose_strip(CODE, &CellStyle::default(), 20, 255).unwrap();
    rp.write_pix(&strip).unwrap();

    // -----------------------------------------------------------
    // Uniform pitch, 12 digits
    // -----------------------------------------------------------
    let recognizer = Recognizer::default();
    let result = recognizer.recognize(&strip, &model).unwrap();
    eprintln!("Read: {}", result);
    rp.compare_strings(CODE.as_bytes(), result.to_string().as_bytes());
    rp.compare_values(12_345_678_901.0, result.value().unwrap() as f64, 0.0);
    rp.compare_values(12.0, result.cells.len() as f64, 0.0);
    rp.check(
        result.cells.iter().all(|c| c.w == 40 && c.h == 64 && c.y == 20),
        "cells follow the printed pitch",
    );

    // Determinism
    let again = recognizer.recognize(&strip, &model).unwrap();
    rp.check(again == result, "repeat recognition is identical");

    // -----------------------------------------------------------
    // Recognizing through files
    // -----------------------------------------------------------
    let dir = scratch_dir("recognize_files").unwrap();
    let model_path = dir.join("digits.dmodel");
    let image_path = dir.join("strip.png");
    model.write_to_file(&model_path).unwrap();
    digitread_io::write_image(&strip, &image_path, ImageFormat::Png).unwrap();
    let from_files = recognize_file(&image_path, &model_path, &RecognizerOptions::default()).unwrap();
    rp.compare_strings(CODE.as_bytes(), from_files.to_string().as_bytes());

    // -----------------------------------------------------------
    // A model from a different descriptor configuration
    // -----------------------------------------------------------
    let small_cells = HogConfig {
        cell: 8,
        ..HogConfig::default()
    };
    let other = trained_model(small_cells);
    let mismatch = recognizer.recognize(&strip, &other);
    rp.check(
        matches!(
            mismatch,
            Err(RecogError::Classification(ClassificationError::ConfigMismatch { model, extractor }))
                if model.cell == 8 && extractor.cell == 16
        ),
        "config mismatch is reported",
    );

    // -----------------------------------------------------------
    // Nothing dark on the page
    // -----------------------------------------------------------
    let blank = Pix::from_gray_bytes(64, 32, &[250; 64 * 32]).unwrap();
    rp.check(
        matches!(recognizer.recognize(&blank, &model), Err(RecogError::NoRegionFound)),
        "blank page has no region",
    );

    // -----------------------------------------------------------
    // Remainder columns land in the last cell
    // -----------------------------------------------------------
    let seven = Segmenter::new(SegmentOptions {
        strategy: SegmentStrategy::FixedWidth(7),
        ..SegmentOptions::default()
    });
    let cells = seven.segment(&strip).unwrap();
    let widths: Vec<i32> = cells.iter().map(|c| c.bounds.w).collect();
    eprintln!("FixedWidth(7) widths: {:?}", widths);
    rp.compare_values(7.0, cells.len() as f64, 0.0);
    rp.check(widths[..6].iter().all(|&w| w == 68), "leading cells are w / n wide");
    rp.compare_values(72.0, widths[6] as f64, 0.0);
    rp.compare_values(480.0, widths.iter().sum::<i32>() as f64, 0.0);
    rp.check(
        cells.iter().all(|c| c.pix.width() == 128 && c.pix.height() == 128),
        "cells resized to the canonical size",
    );

    // -----------------------------------------------------------
    // Gap detection finds one cell per glyph
    // -----------------------------------------------------------
    let gaps = Segmenter::new(SegmentOptions {
        strategy: SegmentStrategy::gaps(),
        ..SegmentOptions::default()
    });
    let cells = gaps.segment(&strip).unwrap();
    rp.compare_values(12.0, cells.len() as f64, 0.0);
    rp.compare_values(
        480.0,
        cells.iter().map(|c| c.bounds.w).sum::<i32>() as f64,
        0.0,
    );
    rp.check(
        cells.windows(2).all(|p| p[0].bounds.right() == p[1].bounds.x),
        "gap cells tile the region left to right",
    );

    let expect_13 = Recognizer::from_options(
        SegmentOptions {
            strategy: SegmentStrategy::gaps(),
            ..SegmentOptions::default()
        },
        HogConfig::default(),
        RecognizeOptions {
            expected_digits: Some(13),
            ..RecognizeOptions::default()
        },
    )
    .unwrap();
    rp.check(
        matches!(
            expect_13.recognize(&strip, &model),
            Err(RecogError::Classification(ClassificationError::DigitCountMismatch {
                expected: 13,
                found: 12
            }))
        ),
        "digit count mismatch is reported",
    );

    // -----------------------------------------------------------
    // Resource limits
    // -----------------------------------------------------------
    let hurried = Recognizer::from_options(
        SegmentOptions::default(),
        HogConfig::default(),
        RecognizeOptions {
            deadline: Some(Duration::from_nanos(1)),
            ..RecognizeOptions::default()
        },
    )
    .unwrap();
    rp.check(
        matches!(
            hurried.recognize(&strip, &model),
            Err(RecogError::Classification(ClassificationError::Timeout { .. }))
        ),
        "deadline is enforced",
    );

    let small_budget = Recognizer::from_options(
        SegmentOptions {
            max_pixels: 10_000,
            ..SegmentOptions::default()
        },
        HogConfig::default(),
        RecognizeOptions::default(),
    )
    .unwrap();
    rp.check(
        matches!(
            small_budget.recognize(&strip, &model),
            Err(RecogError::Classification(ClassificationError::ImageTooLarge { .. }))
        ),
        "oversized image rejected",
    );

    // -----------------------------------------------------------
    // The active model slot
    // -----------------------------------------------------------
    let active = ActiveModel::new();
    rp.check(active.state() == ModelState::Untrained, "starts untrained");
    rp.check(
        matches!(
            active.recognize(&recognizer, &strip),
            Err(RecogError::Classification(ClassificationError::Untrained))
        ),
        "untrained slot refuses to recognize",
    );
    let previous = active.load(&model_path).unwrap();
    rp.check(previous.is_none() && active.state() == ModelState::Trained, "load trains the slot");
    let read = active.recognize(&recognizer, &strip).unwrap();
    rp.compare_strings(CODE.as_bytes(), read.to_string().as_bytes());

    let held = active.current().unwrap();
    let replaced = active.install(other).unwrap();
    rp.check(std::sync::Arc::ptr_eq(&held, &replaced), "install returns the old model");
    rp.check(*held == model, "old readers keep their model");

    assert!(rp.cleanup(), "recognize regression test failed");
}
