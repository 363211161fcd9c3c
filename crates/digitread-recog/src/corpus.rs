//! Training corpus loader
//!
//! A corpus is a flat directory of single-digit images whose file names
//! start with the label: `3_0001.png`, `7-scan.jpg`, `0.pgm` and `5 b.png`
//! are samples of 3, 7, 0 and 5.
//!
//! Files with an image extension whose label cannot be parsed, or whose
//! contents cannot be decoded, are skipped with a warning and recorded in
//! [`Corpus::skipped`]. They never abort the load.

use crate::error::{RecogError, RecogResult};
use digitread_core::{Pix, PixelDepth};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File extensions (lowercase) considered image samples
pub const CORPUS_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pgm", "pnm", "ppm"];

/// Characters that end the label token of a file name
const LABEL_SEPARATORS: &[char] = &['_', '-', '.', ' '];

/// One labeled digit image
#[derive(Debug, Clone)]
pub struct TrainingSample {
    /// 8 bpp grayscale image
    pub pix: Pix,
    /// Digit label, 0 to 9
    pub label: u8,
    /// File the sample was read from
    pub path: PathBuf,
}

/// A file that was passed over while loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// The samples of one corpus directory, sorted by file name
#[derive(Debug, Clone)]
pub struct Corpus {
    /// Directory the corpus was read from
    pub dir: PathBuf,
    /// Loaded samples
    pub samples: Vec<TrainingSample>,
    /// Image files that could not be used
    pub skipped: Vec<SkippedFile>,
}

impl Corpus {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no sample was loaded
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples per digit
    pub fn label_counts(&self) -> [usize; 10] {
        let mut counts = [0; 10];
        for s in &self.samples {
            counts[s.label as usize] += 1;
        }
        counts
    }

    /// Sample images in corpus order
    pub fn images(&self) -> Vec<Pix> {
        self.samples.iter().map(|s| s.pix.clone()).collect()
    }

    /// Sample labels in corpus order
    pub fn labels(&self) -> Vec<u8> {
        self.samples.iter().map(|s| s.label).collect()
    }
}

/// Parse the digit label from a file name.
///
/// The label is the token before the first separator (`_`, `-`, `.` or a
/// space) and must be exactly one decimal digit.
pub fn parse_label(file_name: &str) -> Option<u8> {
    let token = file_name.split(LABEL_SEPARATORS).next()?;
    let mut chars = token.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    first.to_digit(10).map(|d| d as u8)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| CORPUS_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_sample(path: &Path, label: u8) -> RecogResult<TrainingSample> {
    let pix = digitread_io::read_image(path)?;
    let pix = match pix.depth() {
        PixelDepth::Bit8 => pix,
        _ => pix.convert_to_gray()?,
    };
    Ok(TrainingSample {
        pix,
        label,
        path: path.to_path_buf(),
    })
}

/// Load every labeled sample of a directory.
///
/// Sub-directories and files without an image extension are ignored.
///
/// # Errors
///
/// Returns [`RecogError::Io`] if the directory cannot be listed and
/// [`RecogError::EmptyCorpus`] if no sample could be loaded.
pub fn load_corpus(dir: impl AsRef<Path>) -> RecogResult<Corpus> {
    let dir = dir.as_ref();
    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            candidates.push(path);
        } else {
            debug!(path = %path.display(), "ignoring non-image entry");
        }
    }
    candidates.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let loaded: Vec<Result<TrainingSample, SkippedFile>> = candidates
        .par_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let Some(label) = parse_label(&name) else {
                return Err(SkippedFile {
                    path: path.clone(),
                    reason: "file name does not start with a digit label".to_string(),
                });
            };
            load_sample(path, label).map_err(|e| SkippedFile {
                path: path.clone(),
                reason: e.to_string(),
            })
        })
        .collect();

    let mut samples = Vec::with_capacity(loaded.len());
    let mut skipped = Vec::new();
    for result in loaded {
        match result {
            Ok(sample) => samples.push(sample),
            Err(skip) => {
                warn!(path = %skip.path.display(), reason = %skip.reason, "skipping corpus file");
                skipped.push(skip);
            }
        }
    }

    if samples.is_empty() {
        return Err(RecogError::EmptyCorpus {
            dir: dir.to_path_buf(),
        });
    }

    let corpus = Corpus {
        dir: dir.to_path_buf(),
        samples,
        skipped,
    };
    info!(
        dir = %dir.display(),
        samples = corpus.len(),
        skipped = corpus.skipped.len(),
        "loaded training corpus"
    );
    Ok(corpus)
}
