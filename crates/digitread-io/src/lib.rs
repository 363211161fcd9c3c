//! digitread I/O - Image reading and writing
//!
//! Supported formats, each behind a cargo feature:
//!
//! | Format | Read | Write | Feature      |
//! |--------|------|-------|--------------|
//! | PNG    | yes  | yes   | `png-format` |
//! | JPEG   | yes  | no    | `jpeg`       |
//! | PNM    | yes  | yes   | `pnm`        |
//!
//! The format of an input is always detected from its magic bytes.

mod error;
pub mod format;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(feature = "png-format")]
pub mod png;
#[cfg(feature = "pnm")]
pub mod pnm;

pub use digitread_core::ImageFormat;
pub use error::{IoError, IoResult};
pub use format::{detect_format, detect_format_from_bytes};

use digitread_core::Pix;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

/// Read an image from a file path.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the file cannot be opened and
/// [`IoError::UnsupportedFormat`] if its contents are not a known format.
pub fn read_image<P: AsRef<Path>>(path: P) -> IoResult<Pix> {
    let data = std::fs::read(path)?;
    read_image_mem(&data)
}

/// Read an image from an in-memory buffer.
pub fn read_image_mem(data: &[u8]) -> IoResult<Pix> {
    let format = detect_format_from_bytes(data)?;
    read_image_format(Cursor::new(data), format)
}

fn read_image_format(reader: Cursor<&[u8]>, format: ImageFormat) -> IoResult<Pix> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::read_png(reader),
        #[cfg(feature = "jpeg")]
        ImageFormat::Jpeg => jpeg::read_jpeg(reader),
        #[cfg(feature = "pnm")]
        ImageFormat::Pnm => pnm::read_pnm(reader),
        _ => Err(IoError::UnsupportedFormat(format!(
            "reading {:?} is not enabled",
            format
        ))),
    }
}

/// Write an image to a file path in the given format.
pub fn write_image<P: AsRef<Path>>(pix: &Pix, path: P, format: ImageFormat) -> IoResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_image_format(pix, &mut writer, format)?;
    writer.flush()?;
    Ok(())
}

/// Encode an image into a byte vector.
pub fn write_image_mem(pix: &Pix, format: ImageFormat) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_image_format(pix, &mut buffer, format)?;
    Ok(buffer)
}

fn write_image_format<W: Write>(pix: &Pix, writer: W, format: ImageFormat) -> IoResult<()> {
    match format {
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::write_png(pix, writer),
        #[cfg(feature = "pnm")]
        ImageFormat::Pnm => pnm::write_pnm(pix, writer),
        _ => {
            let _ = (pix, writer);
            Err(IoError::UnsupportedFormat(format!(
                "writing {:?} is not supported",
                format
            )))
        }
    }
}
