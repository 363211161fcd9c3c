//! PNG image format support
//!
//! Decoding expands palettes and low bit depths and strips 16-bit samples,
//! so every PNG lands as either 8 bpp gray or 32 bpp RGB. Alpha is dropped.

use crate::{IoError, IoResult};
use digitread_core::{Pix, PixMut, PixelDepth, color};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};
use std::io::{BufRead, Seek, Write};

/// Read a PNG image
pub fn read_png<R: BufRead + Seek>(reader: R) -> IoResult<Pix> {
    let mut decoder = Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let (width, height) = {
        let info = reader.info();
        (info.width, info.height)
    };
    let (color_type, bit_depth) = reader.output_color_type();
    if bit_depth != BitDepth::Eight {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported PNG output depth: {:?}",
            bit_depth
        )));
    }

    let (pix_depth, samples) = match color_type {
        ColorType::Grayscale => (PixelDepth::Bit8, 1),
        ColorType::GrayscaleAlpha => (PixelDepth::Bit8, 2),
        ColorType::Rgb => (PixelDepth::Bit32, 3),
        ColorType::Rgba => (PixelDepth::Bit32, 4),
        ColorType::Indexed => {
            return Err(IoError::UnsupportedFormat(
                "PNG palette was not expanded".to_string(),
            ));
        }
    };

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let bytes_per_row = output_info.line_size;
    let data = &buf[..output_info.buffer_size()];
    if data.len() < bytes_per_row * height as usize {
        return Err(IoError::InvalidData("PNG frame is truncated".to_string()));
    }

    let mut pix_mut = PixMut::new(width, height, pix_depth)?;
    pix_mut.set_informat(digitread_core::ImageFormat::Png);

    for y in 0..height {
        let row = &data[y as usize * bytes_per_row..];
        for x in 0..width {
            let idx = x as usize * samples;
            let val = if pix_depth == PixelDepth::Bit8 {
                row[idx] as u32
            } else {
                color::compose_rgb(row[idx], row[idx + 1], row[idx + 2])
            };
            pix_mut.set_pixel_unchecked(x, y, val);
        }
    }

    Ok(pix_mut.into())
}

/// Write a PNG image
///
/// 1 bpp images are written as 1-bit grayscale with foreground black,
/// 8 bpp as 8-bit grayscale and 32 bpp as 8-bit RGB.
pub fn write_png<W: Write>(pix: &Pix, writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    let (color_type, bit_depth, bytes_per_row) = match pix.depth() {
        PixelDepth::Bit1 => (ColorType::Grayscale, BitDepth::One, width.div_ceil(8)),
        PixelDepth::Bit8 => (ColorType::Grayscale, BitDepth::Eight, width),
        PixelDepth::Bit32 => (ColorType::Rgb, BitDepth::Eight, width * 3),
    };
    let bytes_per_row = bytes_per_row as usize;

    let mut encoder = Encoder::new(writer, width, height);
    encoder.set_color(color_type);
    encoder.set_depth(bit_depth);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(format!("PNG header error: {}", e)))?;

    let mut data = vec![0u8; bytes_per_row * height as usize];

    for y in 0..height {
        let row = &mut data[y as usize * bytes_per_row..(y as usize + 1) * bytes_per_row];
        match pix.depth() {
            PixelDepth::Bit1 => {
                for x in 0..width {
                    // PNG gray 0 is black, which is our foreground 1
                    if pix.get_pixel_unchecked(x, y) == 0 {
                        row[(x / 8) as usize] |= 1 << (7 - (x % 8));
                    }
                }
            }
            PixelDepth::Bit8 => {
                for x in 0..width {
                    row[x as usize] = pix.get_pixel_unchecked(x, y) as u8;
                }
            }
            PixelDepth::Bit32 => {
                for x in 0..width {
                    let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                    let idx = x as usize * 3;
                    row[idx] = r;
                    row[idx + 1] = g;
                    row[idx + 2] = b;
                }
            }
        }
    }

    writer
        .write_image_data(&data)
        .map_err(|e| IoError::EncodeError(format!("PNG write error: {}", e)))?;

    Ok(())
}
