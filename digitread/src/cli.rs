//! Command line interface
//!
//! - `train`: build a model from a corpus directory
//! - `scan`: read the digits of one or more barcode images
//! - `segment`: write the digit cells of an image as PNG files
//! - `inspect`: print the header of a model file

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use digitread::io::{ImageFormat, read_image, write_image};
use digitread::recog::segment::DEFAULT_MIN_GLYPH_WIDTH;
use digitread::recog::{
    DEFAULT_BLOCK_SIZE, DEFAULT_CANONICAL_SIZE, DEFAULT_CELL_SIZE, DEFAULT_DIGIT_COUNT, DEFAULT_K,
    DEFAULT_ORIENTATIONS, DEFAULT_SEED, DEFAULT_TEST_RATIO, DEFAULT_THRESHOLD, DigitModel,
    HogConfig, RecognizeOptions, Recognizer, SegmentOptions, SegmentStrategy, Segmenter,
    TrainOptions, train_to_file,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "digitread",
    version,
    about = "Read the printed digits under barcodes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model from a directory of labeled digit images
    Train(TrainArgs),
    /// Read the digits of barcode images
    Scan(ScanArgs),
    /// Write the digit cells of an image for inspection
    Segment(SegmentArgs),
    /// Print the header of a model file
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Corpus directory; file names start with the digit label
    pub corpus: PathBuf,
    /// Where to write the model
    #[arg(short, long)]
    pub output: PathBuf,
    /// Neighbors consulted per vote
    #[arg(long, default_value_t = DEFAULT_K)]
    pub k: usize,
    /// Fraction of samples held out for accuracy measurement
    #[arg(long, default_value_t = DEFAULT_TEST_RATIO)]
    pub test_ratio: f64,
    /// Seed of the train/test shuffle
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,
    /// Side of the canonical cell image
    #[arg(long, default_value_t = DEFAULT_CANONICAL_SIZE)]
    pub size: u32,
    /// HOG cell size in pixels
    #[arg(long, default_value_t = DEFAULT_CELL_SIZE)]
    pub cell: u32,
    /// HOG block size in cells
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block: u32,
    /// HOG orientation bins
    #[arg(long, default_value_t = DEFAULT_ORIENTATIONS)]
    pub orientations: u32,
}

/// How the barcode region is split into cells
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Number of equal-width digit cells
    #[arg(long, default_value_t = DEFAULT_DIGIT_COUNT, conflicts_with = "gaps")]
    pub digits: usize,
    /// Split at column gaps instead; columns with at most this ink fraction are gaps
    #[arg(long, value_name = "RATIO")]
    pub gaps: Option<f32>,
    /// Binarization threshold
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u8,
}

impl SplitArgs {
    fn segment_options(&self, cell: (u32, u32)) -> SegmentOptions {
        let strategy = match self.gaps {
            Some(ratio) => SegmentStrategy::GapDetection {
                max_ink_ratio: ratio,
                min_glyph_width: DEFAULT_MIN_GLYPH_WIDTH,
            },
            None => SegmentStrategy::FixedWidth(self.digits),
        };
        SegmentOptions {
            threshold: self.threshold,
            strategy,
            cell_width: cell.0,
            cell_height: cell.1,
            ..SegmentOptions::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Model file
    pub model: PathBuf,
    /// Images to read
    #[arg(required = true)]
    pub images: Vec<PathBuf>,
    #[command(flatten)]
    pub split: SplitArgs,
    /// Fail images that do not yield exactly this many digits
    #[arg(long)]
    pub expect: Option<usize>,
    /// Per-image time limit in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SegmentArgs {
    /// Image to segment
    pub image: PathBuf,
    /// Output directory for the cell images
    #[arg(short, long)]
    pub output: PathBuf,
    #[command(flatten)]
    pub split: SplitArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Model file
    pub model: PathBuf,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Scan(args) => run_scan(args),
            Commands::Segment(args) => run_segment(args),
            Commands::Inspect(args) => run_inspect(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let hog = HogConfig {
        width: args.size,
        height: args.size,
        cell: args.cell,
        block: args.block,
        orientations: args.orientations,
    };
    let options = TrainOptions {
        test_ratio: args.test_ratio,
        k: args.k,
        seed: args.seed,
    };
    let report = train_to_file(&args.corpus, &options, &hog, &args.output).with_context(|| {
        format!(
            "training from {} into {}",
            args.corpus.display(),
            args.output.display()
        )
    })?;

    println!("samples:   {} train, {} held out", report.train_count, report.test_count);
    match report.accuracy {
        Some(acc) => println!("accuracy:  {:.4}", acc),
        None => println!("accuracy:  n/a (nothing held out)"),
    }
    println!("model:     {}", args.output.display());
    Ok(())
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let model = DigitModel::read_from_file(&args.model)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    let hog = *model.config();
    let recognizer = Recognizer::from_options(
        args.split.segment_options((hog.width, hog.height)),
        hog,
        RecognizeOptions {
            deadline: args.timeout_ms.map(Duration::from_millis),
            expected_digits: args.expect,
        },
    )?;

    let mut failed = 0;
    for path in &args.images {
        let result = read_image(path)
            .map_err(anyhow::Error::from)
            .and_then(|pix| Ok(recognizer.recognize(&pix, &model)?));
        match result {
            Ok(code) => println!("{}\t{}", path.display(), code),
            Err(e) => {
                failed += 1;
                error!(path = %path.display(), "{:#}", e);
                println!("{}\tERROR", path.display());
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} images could not be read", failed, args.images.len());
    }
    Ok(())
}

fn run_segment(args: SegmentArgs) -> Result<()> {
    let pix = read_image(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    let size = DEFAULT_CANONICAL_SIZE;
    let segmenter = Segmenter::new(args.split.segment_options((size, size)));
    let cells = segmenter.segment(&pix)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let stem = args
        .image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cell".to_string());
    for (i, cell) in cells.iter().enumerate() {
        let path = args.output.join(format!(
            "{}_{:02}.{}",
            stem,
            i,
            ImageFormat::Png.extension()
        ));
        write_image(&cell.pix, &path, ImageFormat::Png)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("{}\t{}", path.display(), cell.bounds);
    }
    info!(cells = cells.len(), "segmented {}", args.image.display());
    Ok(())
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let model = DigitModel::read_from_file(&args.model)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    println!("model:       {}", args.model.display());
    println!("k:           {}", model.k());
    println!("samples:     {}", model.len());
    println!("features:    {}", model.nfeatures());
    println!("descriptor:  {}", model.config());
    let counts = model.label_counts();
    for (digit, count) in counts.iter().enumerate() {
        println!("  digit {}:   {}", digit, count);
    }
    Ok(())
}
