//! Image format detection
//!
//! The format of an input is decided by its leading bytes only. File
//! extensions are never trusted: a `.png` holding JPEG data is read as
//! JPEG.

use crate::{IoError, IoResult};
use digitread_core::ImageFormat;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Leading bytes of every readable format
const SIGNATURES: &[(&[u8], ImageFormat)] = &[
    (b"\x89PNG\r\n\x1a\n", ImageFormat::Png),
    (b"\xff\xd8\xff", ImageFormat::Jpeg),
    (b"P1", ImageFormat::Pnm),
    (b"P2", ImageFormat::Pnm),
    (b"P3", ImageFormat::Pnm),
    (b"P4", ImageFormat::Pnm),
    (b"P5", ImageFormat::Pnm),
    (b"P6", ImageFormat::Pnm),
];

/// Longest signature in [`SIGNATURES`]
const SIGNATURE_LEN: usize = 8;

/// Detect the format of an image file.
pub fn detect_format<P: AsRef<Path>>(path: P) -> IoResult<ImageFormat> {
    let mut head = Vec::with_capacity(SIGNATURE_LEN);
    File::open(path)?
        .take(SIGNATURE_LEN as u64)
        .read_to_end(&mut head)?;
    detect_format_from_bytes(&head)
}

/// Detect the format of an in-memory image.
///
/// # Errors
///
/// Returns [`IoError::InvalidData`] for inputs shorter than two bytes and
/// [`IoError::UnsupportedFormat`] when no signature matches.
pub fn detect_format_from_bytes(data: &[u8]) -> IoResult<ImageFormat> {
    if data.len() < 2 {
        return Err(IoError::InvalidData(format!(
            "{} bytes are not enough to detect a format",
            data.len()
        )));
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| data.starts_with(magic))
        .map(|&(_, format)| format)
        .ok_or_else(|| IoError::UnsupportedFormat("unknown image format".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_known_signatures() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 13];
        assert_eq!(detect_format_from_bytes(&png).unwrap(), ImageFormat::Png);

        let jfif = [0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        assert_eq!(detect_format_from_bytes(&jfif).unwrap(), ImageFormat::Jpeg);

        for header in [&b"P5\n100 100\n255\n"[..], b"P1\n1 1\n0\n", b"P6 2 2 255 "] {
            assert_eq!(detect_format_from_bytes(header).unwrap(), ImageFormat::Pnm);
        }
    }

    #[test]
    fn test_detect_rejects_other_data() {
        assert!(matches!(
            detect_format_from_bytes(b"P"),
            Err(IoError::InvalidData(_))
        ));
        for data in [&b"P7\nWIDTH 1\n"[..], b"GIF89a\x00\x00", b"BM\x00\x00", b"hello"] {
            assert!(matches!(
                detect_format_from_bytes(data),
                Err(IoError::UnsupportedFormat(_))
            ));
        }
    }

    #[test]
    fn test_truncated_png_signature_is_unknown() {
        assert!(detect_format_from_bytes(b"\x89PNG").is_err());
    }
}
