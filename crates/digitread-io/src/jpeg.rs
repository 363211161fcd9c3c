//! JPEG image format support
//!
//! Reads JPEG images using the `jpeg-decoder` crate. Grayscale files give
//! 8 bpp images, color files give 32 bpp RGB. Writing is not supported.

use crate::{IoError, IoResult};
use digitread_core::{ImageFormat, Pix, PixMut, PixelDepth, color};
use jpeg_decoder::{Decoder, PixelFormat};
use std::io::Read;

/// Read a JPEG image from a reader.
///
/// # Arguments
/// * `reader` - A reader positioned at the JPEG SOI marker (`FF D8`)
///
/// # Returns
/// A `Pix` at 8-bpp (grayscale) or 32-bpp (RGB).
pub fn read_jpeg<R: Read>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(format!("JPEG decode error: {}", e)))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("JPEG header missing".to_string()))?;

    let width = info.width as u32;
    let height = info.height as u32;
    let npixels = width as usize * height as usize;

    let (depth, samples) = match info.pixel_format {
        PixelFormat::L8 => (PixelDepth::Bit8, 1),
        PixelFormat::L16 => (PixelDepth::Bit8, 2),
        PixelFormat::RGB24 => (PixelDepth::Bit32, 3),
        PixelFormat::CMYK32 => {
            return Err(IoError::UnsupportedFormat(
                "CMYK JPEG is not supported".to_string(),
            ));
        }
    };
    if pixels.len() < npixels * samples {
        return Err(IoError::InvalidData("JPEG data is truncated".to_string()));
    }

    let mut pix_mut = PixMut::new(width, height, depth)?;
    pix_mut.set_informat(ImageFormat::Jpeg);

    for (i, px) in pixels.chunks_exact(samples).take(npixels).enumerate() {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        let val = match info.pixel_format {
            // L16 is big-endian; keep the high byte
            PixelFormat::L8 | PixelFormat::L16 => px[0] as u32,
            _ => color::compose_rgb(px[0], px[1], px[2]),
        };
        pix_mut.set_pixel_unchecked(x, y, val);
    }

    Ok(pix_mut.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_garbage_is_error() {
        let data: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x02, 0x00];
        assert!(read_jpeg(data).is_err());
    }

    #[test]
    fn test_jpeg_empty_is_error() {
        let data: &[u8] = &[];
        assert!(read_jpeg(data).is_err());
    }
}
