//! digitread-test - Regression test framework for digitread
//!
//! Provides [`RegParams`] for `tests/*_reg.rs` style regression tests and
//! the [`synth`] module, which renders digit cells and barcode strips
//! from a built-in bitmap font so no external test images are needed.
//!
//! # Usage
//!
//! ```ignore
//! use digitread_test::RegParams;
//!
//! let mut rp = RegParams::new("segment");
//! rp.compare_values(12.0, cells.len() as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "display" to write intermediate images

mod error;
mod params;
pub mod synth;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

use std::path::PathBuf;

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // digitread-test is at crates/digitread-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}

/// Create an empty scratch directory for on-disk fixtures.
///
/// Any previous content under the same name is removed first, so each
/// test should use its own name.
pub fn scratch_dir(name: &str) -> TestResult<PathBuf> {
    let dir = PathBuf::from(format!("{}/scratch/{}", regout_dir(), name));
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir).map_err(|e| TestError::DirectoryCreate {
        path: dir.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
