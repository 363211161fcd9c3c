//! PNM (Portable Any Map) format support
//!
//! Reads all six netpbm variants (P1-P6) and writes the binary ones:
//! P4 for 1 bpp, P5 for 8 bpp and P6 for 32 bpp. Samples with a maxval
//! other than 255 are rescaled to 8 bits.

use crate::{IoError, IoResult};
use digitread_core::{ImageFormat, Pix, PixMut, PixelDepth, color};
use std::io::{BufRead, Write};

/// Upper bound on the number of pixels accepted from a PNM header
const MAX_PNM_PIXELS: u64 = 1 << 28;

/// Byte cursor over the header and ASCII raster.
struct Tokens<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn skip_space_and_comments(&mut self) {
        while self.pos < self.data.len() {
            match self.data[self.pos] {
                b'#' => {
                    while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                c if c.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }
    }

    fn next_uint(&mut self) -> IoResult<u32> {
        self.skip_space_and_comments();
        let start = self.pos;
        while self.pos < self.data.len() && self.data[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(IoError::InvalidData("expected integer in PNM".to_string()));
        }
        std::str::from_utf8(&self.data[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| IoError::InvalidData("PNM integer out of range".to_string()))
    }

    /// Next P1 bit; digits may be packed without separators.
    fn next_bit(&mut self) -> IoResult<u32> {
        self.skip_space_and_comments();
        match self.data.get(self.pos) {
            Some(b'0') => {
                self.pos += 1;
                Ok(0)
            }
            Some(b'1') => {
                self.pos += 1;
                Ok(1)
            }
            _ => Err(IoError::InvalidData("expected bit in PBM raster".to_string())),
        }
    }
}

/// Read a PNM image (P1-P6) from a reader.
///
/// # Returns
/// A `Pix` at 1 bpp (PBM), 8 bpp (PGM), or 32 bpp (PPM).
pub fn read_pnm<R: BufRead>(mut reader: R) -> IoResult<Pix> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    if data.len() < 2 || data[0] != b'P' {
        return Err(IoError::InvalidData("missing PNM magic".to_string()));
    }
    let kind = data[1];
    if !(b'1'..=b'6').contains(&kind) {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported PNM variant P{}",
            kind as char
        )));
    }

    let mut tok = Tokens { data: &data, pos: 2 };
    let width = tok.next_uint()?;
    let height = tok.next_uint()?;
    if width == 0 || height == 0 || width as u64 * height as u64 > MAX_PNM_PIXELS {
        return Err(IoError::InvalidData(format!(
            "bad PNM dimensions {}x{}",
            width, height
        )));
    }
    let is_bitmap = kind == b'1' || kind == b'4';
    let maxval = if is_bitmap { 1 } else { tok.next_uint()? };
    if maxval == 0 || maxval > 65535 {
        return Err(IoError::InvalidData(format!("bad PNM maxval {}", maxval)));
    }

    let depth = match kind {
        b'1' | b'4' => PixelDepth::Bit1,
        b'2' | b'5' => PixelDepth::Bit8,
        _ => PixelDepth::Bit32,
    };
    let channels = if depth == PixelDepth::Bit32 { 3 } else { 1 };
    let scale = |v: u32| -> u8 { ((v.min(maxval) * 255 + maxval / 2) / maxval) as u8 };

    let mut pix_mut = PixMut::new(width, height, depth)?;
    pix_mut.set_informat(ImageFormat::Pnm);

    match kind {
        b'1' => {
            for y in 0..height {
                for x in 0..width {
                    let bit = tok.next_bit()?;
                    pix_mut.set_pixel_unchecked(x, y, bit);
                }
            }
        }
        b'2' | b'3' => {
            for y in 0..height {
                for x in 0..width {
                    let mut s = [0u8; 3];
                    for c in s.iter_mut().take(channels) {
                        *c = scale(tok.next_uint()?);
                    }
                    let val = if channels == 1 {
                        s[0] as u32
                    } else {
                        color::compose_rgb(s[0], s[1], s[2])
                    };
                    pix_mut.set_pixel_unchecked(x, y, val);
                }
            }
        }
        _ => {
            // Exactly one whitespace byte separates the header from the raster
            let start = tok.pos + 1;
            let raster = data.get(start..).unwrap_or(&[]);
            if kind == b'4' {
                let row_bytes = width.div_ceil(8) as usize;
                if raster.len() < row_bytes * height as usize {
                    return Err(IoError::InvalidData("PBM raster is truncated".to_string()));
                }
                for y in 0..height {
                    let row = &raster[y as usize * row_bytes..];
                    for x in 0..width {
                        let bit = (row[(x / 8) as usize] >> (7 - (x % 8))) & 1;
                        pix_mut.set_pixel_unchecked(x, y, bit as u32);
                    }
                }
            } else {
                let sample_bytes = if maxval > 255 { 2 } else { 1 };
                let needed = width as usize * height as usize * channels * sample_bytes;
                if raster.len() < needed {
                    return Err(IoError::InvalidData("PNM raster is truncated".to_string()));
                }
                let sample = |i: usize| -> u8 {
                    if sample_bytes == 2 {
                        let hi = raster[2 * i] as u32;
                        let lo = raster[2 * i + 1] as u32;
                        scale((hi << 8) | lo)
                    } else {
                        scale(raster[i] as u32)
                    }
                };
                for y in 0..height {
                    for x in 0..width {
                        let i = (y as usize * width as usize + x as usize) * channels;
                        let val = if channels == 1 {
                            sample(i) as u32
                        } else {
                            color::compose_rgb(sample(i), sample(i + 1), sample(i + 2))
                        };
                        pix_mut.set_pixel_unchecked(x, y, val);
                    }
                }
            }
        }
    }

    Ok(pix_mut.into())
}

/// Write a `Pix` as binary PNM to a writer.
///
/// Chooses P4 (1 bpp), P5 (8 bpp grayscale), or P6 (32 bpp RGB)
/// based on the pixel depth.
pub fn write_pnm<W: Write>(pix: &Pix, mut writer: W) -> IoResult<()> {
    let width = pix.width();
    let height = pix.height();

    match pix.depth() {
        PixelDepth::Bit1 => {
            write!(writer, "P4\n{} {}\n", width, height)?;
            let row_bytes = width.div_ceil(8) as usize;
            let mut row = vec![0u8; row_bytes];
            for y in 0..height {
                row.fill(0);
                for x in 0..width {
                    if pix.get_pixel_unchecked(x, y) != 0 {
                        row[(x / 8) as usize] |= 1 << (7 - (x % 8));
                    }
                }
                writer.write_all(&row)?;
            }
        }
        PixelDepth::Bit8 => {
            write!(writer, "P5\n{} {}\n255\n", width, height)?;
            let mut row = vec![0u8; width as usize];
            for y in 0..height {
                for x in 0..width {
                    row[x as usize] = pix.get_pixel_unchecked(x, y) as u8;
                }
                writer.write_all(&row)?;
            }
        }
        PixelDepth::Bit32 => {
            write!(writer, "P6\n{} {}\n255\n", width, height)?;
            let mut row = vec![0u8; width as usize * 3];
            for y in 0..height {
                for x in 0..width {
                    let (r, g, b) = color::extract_rgb(pix.get_pixel_unchecked(x, y));
                    let i = x as usize * 3;
                    row[i] = r;
                    row[i + 1] = g;
                    row[i + 2] = b;
                }
                writer.write_all(&row)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
