//! Synthetic digit fixtures
//!
//! Renders the digits 0-9 from a 5x7 bitmap font, so tests never depend
//! on external image files. A rendered cell is a dark field ("paper")
//! with a light glyph ("ink"); a strip of cells on a white page looks like
//! the dark label a barcode reader looks for.

use crate::error::TestResult;
use digitread_core::{ImageFormat, Pix, PixMut, PixelDepth};
use std::path::{Path, PathBuf};

/// Glyph width in font dots
pub const GLYPH_COLS: u32 = 5;
/// Glyph height in font dots
pub const GLYPH_ROWS: u32 = 7;

/// Rows of each glyph, MSB of the low 5 bits is the leftmost dot.
const FONT: [[u8; GLYPH_ROWS as usize]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
];

/// Check whether font dot (col, row) of `digit` is set.
///
/// Returns `false` for digits above 9 and for positions outside the glyph.
pub fn glyph_dot(digit: u8, col: u32, row: u32) -> bool {
    if digit > 9 || col >= GLYPH_COLS || row >= GLYPH_ROWS {
        return false;
    }
    (FONT[digit as usize][row as usize] >> (GLYPH_COLS - 1 - col)) & 1 == 1
}

/// How a single digit cell is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyle {
    /// Cell width in pixels
    pub width: u32,
    /// Cell height in pixels
    pub height: u32,
    /// Side of one font dot in pixels
    pub dot: u32,
    /// Horizontal glyph offset from the centered position
    pub dx: i32,
    /// Vertical glyph offset from the centered position
    pub dy: i32,
    /// Glyph gray level
    pub ink: u8,
    /// Background gray level
    pub paper: u8,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            width: 40,
            height: 64,
            dot: 5,
            dx: 0,
            dy: 0,
            ink: 230,
            paper: 40,
        }
    }
}

impl CellStyle {
    /// A deterministic variation of the default style.
    ///
    /// Indices 0..25 visit every glyph offset in `[-2, 2] x [-2, 2]`; gray
    /// levels drift with the index but stay on their side of 128.
    pub fn variant(index: usize) -> Self {
        Self {
            dx: (index % 5) as i32 - 2,
            dy: ((index / 5) % 5) as i32 - 2,
            ink: 200 + (index * 7 % 50) as u8,
            paper: 20 + (index * 11 % 60) as u8,
            ..Self::default()
        }
    }
}

fn paint_cell(pix: &mut PixMut, digit: u8, style: &CellStyle, left: u32) {
    let glyph_w = (GLYPH_COLS * style.dot) as i32;
    let glyph_h = (GLYPH_ROWS * style.dot) as i32;
    let x0 = (style.width as i32 - glyph_w) / 2 + style.dx;
    let y0 = (style.height as i32 - glyph_h) / 2 + style.dy;
    let dot = style.dot.max(1) as i32;

    for y in 0..style.height as i32 {
        for x in 0..style.width as i32 {
            let (gx, gy) = (x - x0, y - y0);
            let on = gx >= 0
                && gy >= 0
                && gx < glyph_w
                && gy < glyph_h
                && glyph_dot(digit, (gx / dot) as u32, (gy / dot) as u32);
            let val = if on { style.ink } else { style.paper };
            let px = left + x as u32;
            if px < pix.width() && (y as u32) < pix.height() {
                pix.set_pixel_unchecked(px, y as u32, val as u32);
            }
        }
    }
}

/// Render one digit as an 8 bpp cell.
pub fn render_cell(digit: u8, style: &CellStyle) -> TestResult<Pix> {
    let mut pix = PixMut::new(style.width, style.height, PixelDepth::Bit8)?;
    paint_cell(&mut pix, digit, style, 0);
    Ok(pix.into())
}

/// Render a row of digits at a uniform pitch on a page.
///
/// The cells are placed edge to edge, so their dark backgrounds merge into
/// one rectangle of `digits.len() * style.width` by `style.height` pixels,
/// surrounded by `margin` pixels of `page` gray. Characters other than
/// ASCII digits produce blank cells.
pub fn compose_strip(digits: &str, style: &CellStyle, margin: u32, page: u8) -> TestResult<Pix> {
    let count = digits.chars().count().max(1) as u32;
    let width = count * style.width + 2 * margin;
    let height = style.height + 2 * margin;
    let mut pix = PixMut::new(width, height, PixelDepth::Bit8)?;
    pix.set_all(page as u32);

    let mut strip = PixMut::new(count * style.width, style.height, PixelDepth::Bit8)?;
    for (i, c) in digits.chars().enumerate() {
        let digit = c.to_digit(10).map(|d| d as u8).unwrap_or(u8::MAX);
        paint_cell(&mut strip, digit, style, i as u32 * style.width);
    }
    for y in 0..strip.height() {
        for x in 0..strip.width() {
            if let Some(val) = strip.get_pixel(x, y) {
                pix.set_pixel_unchecked(x + margin, y + margin, val);
            }
        }
    }
    Ok(pix.into())
}

/// Write `per_digit` variants of every digit into `dir` as PNG files
/// named `<digit>_<index>.png`.
///
/// Returns the written paths in digit-major order.
pub fn write_corpus(dir: &Path, per_digit: usize) -> TestResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut paths = Vec::with_capacity(per_digit * 10);
    for digit in 0..10u8 {
        for i in 0..per_digit {
            let pix = render_cell(digit, &CellStyle::variant(i))?;
            let path = dir.join(format!("{}_{:03}.{}", digit, i, ImageFormat::Png.extension()));
            digitread_io::write_image(&pix, &path, ImageFormat::Png).map_err(|e| {
                crate::TestError::ImageWrite {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            })?;
            paths.push(path);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_shapes() {
        // "1" has a single column stem
        assert!(glyph_dot(1, 2, 3));
        assert!(!glyph_dot(1, 0, 3));
        // "7" has a full top bar
        assert!((0..GLYPH_COLS).all(|c| glyph_dot(7, c, 0)));
        assert!(!glyph_dot(10, 0, 0));
        assert!(!glyph_dot(8, 5, 0));
    }

    #[test]
    fn test_glyphs_are_distinct() {
        for a in 0..10 {
            for b in (a + 1)..10 {
                assert_ne!(FONT[a], FONT[b]);
            }
        }
    }

    #[test]
    fn test_render_cell() {
        let style = CellStyle::default();
        let pix = render_cell(7, &style).unwrap();
        assert_eq!((pix.width(), pix.height()), (40, 64));
        assert_eq!(pix.get_pixel(0, 0), Some(40));
        // top bar of the 7 starts at the centered glyph origin
        assert_eq!(pix.get_pixel(7, 14), Some(230));
        assert_eq!(pix.get_pixel(31, 14), Some(230));
        assert_eq!(pix.get_pixel(32, 14), Some(40));
    }

    #[test]
    fn test_variants_stay_on_their_side() {
        for i in 0..100 {
            let s = CellStyle::variant(i);
            assert!(s.ink > 128 && s.paper < 128);
            assert!(s.dx.abs() <= 2 && s.dy.abs() <= 2);
        }
        assert_eq!(CellStyle::variant(12).dx, 0);
        assert_eq!(CellStyle::variant(12).dy, 0);
    }

    #[test]
    fn test_compose_strip() {
        let style = CellStyle::default();
        let pix = compose_strip("01", &style, 10, 255).unwrap();
        assert_eq!((pix.width(), pix.height()), (100, 84));
        assert_eq!(pix.get_pixel(0, 0), Some(255));
        assert_eq!(pix.get_pixel(10, 10), Some(40));
        assert_eq!(pix.get_pixel(89, 73), Some(40));
        assert_eq!(pix.get_pixel(90, 73), Some(255));
    }
}
