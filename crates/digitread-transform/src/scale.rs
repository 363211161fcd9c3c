//! Image scaling operations
//!
//! Provides two scaling algorithms:
//! - Linear interpolation (bilinear, per channel for RGB)
//! - Sampling (nearest neighbor)
//!
//! Both map destination pixel centers onto the source grid with
//! `src = (dst + 0.5) * (src_size / dst_size) - 0.5`, so scaling never
//! shifts the image content by half a pixel.

use crate::{TransformError, TransformResult};
use digitread_core::{Pix, PixMut, PixelDepth, color};

/// Largest destination side accepted by the scaling functions
const MAX_DIMENSION: u32 = 1 << 16;

/// Scaling method to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMethod {
    /// Nearest-neighbor sampling (fastest, pixelated results)
    Sampling,
    /// Bilinear interpolation
    #[default]
    Linear,
}

/// Scale an image by the given factors
///
/// # Arguments
/// * `pix` - Input image
/// * `scale_x` - Horizontal scale factor (e.g., 2.0 = double width)
/// * `scale_y` - Vertical scale factor
/// * `method` - Scaling algorithm to use
pub fn scale(pix: &Pix, scale_x: f32, scale_y: f32, method: ScaleMethod) -> TransformResult<Pix> {
    let (wd, hd) = scaled_size(pix, scale_x, scale_y)?;
    resize(pix, wd, hd, method)
}

/// Scale an image to a specific size with bilinear interpolation
///
/// Binary images are resized by sampling instead.
///
/// # Arguments
/// * `pix` - Input image
/// * `width` - Target width (0 to maintain aspect ratio)
/// * `height` - Target height (0 to maintain aspect ratio)
pub fn scale_to_size(pix: &Pix, width: u32, height: u32) -> TransformResult<Pix> {
    let (ws, hs) = (pix.width() as u64, pix.height() as u64);
    let (wd, hd) = match (width, height) {
        (0, 0) => {
            return Err(TransformError::InvalidParameters(
                "both target dimensions are 0".to_string(),
            ));
        }
        (0, h) => (((ws * h as u64 + hs / 2) / hs).max(1) as u32, h),
        (w, 0) => (w, ((hs * w as u64 + ws / 2) / ws).max(1) as u32),
        (w, h) => (w, h),
    };
    resize(pix, wd, hd, ScaleMethod::Linear)
}

/// Scale an image using nearest-neighbor sampling
///
/// # Arguments
/// * `pix` - Input image
/// * `scale_x` - Horizontal scale factor
/// * `scale_y` - Vertical scale factor
pub fn scale_by_sampling(pix: &Pix, scale_x: f32, scale_y: f32) -> TransformResult<Pix> {
    scale(pix, scale_x, scale_y, ScaleMethod::Sampling)
}

fn scaled_size(pix: &Pix, scale_x: f32, scale_y: f32) -> TransformResult<(u32, u32)> {
    if !(scale_x.is_finite() && scale_y.is_finite()) || scale_x <= 0.0 || scale_y <= 0.0 {
        return Err(TransformError::InvalidScaleFactor(format!(
            "{} x {}",
            scale_x, scale_y
        )));
    }
    let wd = (pix.width() as f64 * scale_x as f64).round().max(1.0);
    let hd = (pix.height() as f64 * scale_y as f64).round().max(1.0);
    Ok((wd as u32, hd as u32))
}

fn resize(pix: &Pix, wd: u32, hd: u32, method: ScaleMethod) -> TransformResult<Pix> {
    if wd == 0 || hd == 0 || wd > MAX_DIMENSION || hd > MAX_DIMENSION {
        return Err(TransformError::InvalidParameters(format!(
            "target size {}x{} out of range",
            wd, hd
        )));
    }
    if wd == pix.width() && hd == pix.height() {
        return Ok(pix.clone());
    }
    match (method, pix.depth()) {
        (ScaleMethod::Sampling, _) | (_, PixelDepth::Bit1) => resize_sampled(pix, wd, hd),
        (ScaleMethod::Linear, _) => resize_linear(pix, wd, hd),
    }
}

/// Source coordinate of a destination pixel center, clamped to the grid
#[inline]
fn source_coord(dst: u32, ratio: f64, src_len: u32) -> f64 {
    ((dst as f64 + 0.5) * ratio - 0.5).clamp(0.0, (src_len - 1) as f64)
}

fn resize_sampled(pix: &Pix, wd: u32, hd: u32) -> TransformResult<Pix> {
    let (ws, hs) = (pix.width(), pix.height());
    let rx = ws as f64 / wd as f64;
    let ry = hs as f64 / hd as f64;
    let mut out = PixMut::new(wd, hd, pix.depth())?;

    let xmap: Vec<u32> = (0..wd)
        .map(|x| source_coord(x, rx, ws).round() as u32)
        .collect();
    for y in 0..hd {
        let sy = source_coord(y, ry, hs).round() as u32;
        for (x, &sx) in xmap.iter().enumerate() {
            out.set_pixel_unchecked(x as u32, y, pix.get_pixel_unchecked(sx, sy));
        }
    }
    Ok(out.into())
}

/// Interpolation taps along one axis: left index, right index, right weight
fn linear_taps(dst_len: u32, src_len: u32) -> Vec<(u32, u32, f32)> {
    let ratio = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|d| {
            let s = source_coord(d, ratio, src_len);
            let i0 = s.floor() as u32;
            let i1 = (i0 + 1).min(src_len - 1);
            (i0, i1, (s - i0 as f64) as f32)
        })
        .collect()
}

fn resize_linear(pix: &Pix, wd: u32, hd: u32) -> TransformResult<Pix> {
    let xtaps = linear_taps(wd, pix.width());
    let ytaps = linear_taps(hd, pix.height());
    let mut out = PixMut::new(wd, hd, pix.depth())?;
    let rgb = pix.depth() == PixelDepth::Bit32;

    let lerp2 = |v00: u8, v10: u8, v01: u8, v11: u8, fx: f32, fy: f32| -> u8 {
        let top = v00 as f32 + (v10 as f32 - v00 as f32) * fx;
        let bot = v01 as f32 + (v11 as f32 - v01 as f32) * fx;
        (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8
    };

    for (y, &(y0, y1, fy)) in ytaps.iter().enumerate() {
        for (x, &(x0, x1, fx)) in xtaps.iter().enumerate() {
            let p00 = pix.get_pixel_unchecked(x0, y0);
            let p10 = pix.get_pixel_unchecked(x1, y0);
            let p01 = pix.get_pixel_unchecked(x0, y1);
            let p11 = pix.get_pixel_unchecked(x1, y1);
            let val = if rgb {
                let c00 = color::extract_rgb(p00);
                let c10 = color::extract_rgb(p10);
                let c01 = color::extract_rgb(p01);
                let c11 = color::extract_rgb(p11);
                color::compose_rgb(
                    lerp2(c00.0, c10.0, c01.0, c11.0, fx, fy),
                    lerp2(c00.1, c10.1, c01.1, c11.1, fx, fy),
                    lerp2(c00.2, c10.2, c01.2, c11.2, fx, fy),
                )
            } else {
                lerp2(p00 as u8, p10 as u8, p01 as u8, p11 as u8, fx, fy) as u32
            };
            out.set_pixel_unchecked(x as u32, y as u32, val);
        }
    }
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> Pix {
        let bytes: Vec<u8> = (0..w * h).map(|i| ((i % w) * 255 / (w - 1)) as u8).collect();
        Pix::from_gray_bytes(w, h, &bytes).unwrap()
    }

    #[test]
    fn test_scale_to_size_dimensions() {
        let pix = gradient(40, 64);
        let out = scale_to_size(&pix, 128, 128).unwrap();
        assert_eq!((out.width(), out.height()), (128, 128));
        assert_eq!(out.depth(), PixelDepth::Bit8);

        let out = scale_to_size(&pix, 20, 0).unwrap();
        assert_eq!((out.width(), out.height()), (20, 32));
        assert!(scale_to_size(&pix, 0, 0).is_err());
    }

    #[test]
    fn test_same_size_is_identity() {
        let pix = gradient(16, 16);
        let out = scale_to_size(&pix, 16, 16).unwrap();
        for x in 0..16 {
            assert_eq!(out.get_pixel(x, 3), pix.get_pixel(x, 3));
        }
    }

    #[test]
    fn test_uniform_stays_uniform() {
        let pix = Pix::from_gray_bytes(7, 5, &[77; 35]).unwrap();
        let out = scale_to_size(&pix, 128, 128).unwrap();
        for y in (0..128).step_by(9) {
            for x in (0..128).step_by(7) {
                assert_eq!(out.get_pixel(x, y), Some(77));
            }
        }
    }

    #[test]
    fn test_linear_upscale_is_monotone() {
        let pix = gradient(10, 2);
        let out = scale_to_size(&pix, 37, 2).unwrap();
        assert_eq!(out.get_pixel(0, 0), Some(0));
        assert_eq!(out.get_pixel(36, 0), Some(255));
        for x in 1..37 {
            assert!(out.get_pixel(x, 0).unwrap() >= out.get_pixel(x - 1, 0).unwrap());
        }
    }

    #[test]
    fn test_downscale_by_two_averages() {
        let pix = Pix::from_gray_bytes(4, 1, &[0, 100, 200, 200]).unwrap();
        let out = scale_to_size(&pix, 2, 1).unwrap();
        assert_eq!(out.get_pixel(0, 0), Some(50));
        assert_eq!(out.get_pixel(1, 0), Some(200));
    }

    #[test]
    fn test_sampling_binary() {
        let mut pix = PixMut::new(4, 4, PixelDepth::Bit1).unwrap();
        pix.set_pixel(3, 3, 1).unwrap();
        let pix: Pix = pix.into();
        let out = scale_by_sampling(&pix, 2.0, 2.0).unwrap();
        assert_eq!(out.depth(), PixelDepth::Bit1);
        assert_eq!((out.width(), out.height()), (8, 8));
        assert_eq!(out.get_pixel(7, 7), Some(1));
        assert_eq!(out.get_pixel(0, 0), Some(0));
    }

    #[test]
    fn test_rgb_linear() {
        let mut pix = PixMut::new(2, 1, PixelDepth::Bit32).unwrap();
        pix.set_rgb(0, 0, 0, 0, 0).unwrap();
        pix.set_rgb(1, 0, 200, 100, 50).unwrap();
        let pix: Pix = pix.into();
        let out = scale(&pix, 2.0, 1.0, ScaleMethod::Linear).unwrap();
        assert_eq!(out.get_rgb(0, 0), Some((0, 0, 0)));
        assert_eq!(out.get_rgb(3, 0), Some((200, 100, 50)));
    }

    #[test]
    fn test_invalid_factor() {
        let pix = gradient(4, 4);
        assert!(scale(&pix, 0.0, 1.0, ScaleMethod::Linear).is_err());
        assert!(scale(&pix, f32::NAN, 1.0, ScaleMethod::Sampling).is_err());
    }
}
