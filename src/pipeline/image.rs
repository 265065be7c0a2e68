//! Stage 2, image family: deterministic visual normalisation.
//!
//! Every image upload is reshaped for model input through a fixed stage
//! order. The order matters: each stage operates on the previous stage's
//! output, so reordering changes the result.
//!
//! 1. Decode any common encoding, flatten to 3-channel RGB.
//! 2. Downscale with Lanczos3 only when the longer edge exceeds 1024 px,
//!    preserving aspect ratio up to integer rounding.
//! 3. Contrast × 1.2 — extrapolate away from a flat field at the image's
//!    mean luminance.
//! 4. Sharpness × 1.1 — extrapolate away from a 3×3-smoothed copy.
//! 5. Gaussian blur, sigma 0.5, to knock down sensor noise and the halos the
//!    sharpening step can introduce.
//!
//! The result is re-encoded as JPEG quality 85. The whole chain is pure
//! arithmetic on decoded pixels: identical input bytes always produce
//! identical output bytes.

use crate::error::ProcessError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::io::Cursor;
use tracing::debug;

/// Longest edge allowed before downscaling kicks in.
const MAX_EDGE: u32 = 1024;
const CONTRAST_FACTOR: f32 = 1.2;
const SHARPNESS_FACTOR: f32 = 1.1;
const DENOISE_SIGMA: f32 = 0.5;
const JPEG_QUALITY: u8 = 85;

/// Normalises image uploads.
///
/// Stateless. One instance sits in [`crate::process::Capabilities`] when the
/// `image` feature is compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Run the full normalisation chain on raw image bytes.
    ///
    /// Fails with [`ProcessError::Decode`] when the bytes are not a readable
    /// image. The original bytes are untouched; persisting them is the
    /// orchestrator's business.
    pub fn preprocess(&self, bytes: &[u8]) -> Result<Vec<u8>, ProcessError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| ProcessError::Decode {
            detail: format!("not a readable image: {e}"),
        })?;
        let mut rgb = decoded.to_rgb8();

        let (width, height) = rgb.dimensions();
        if let Some((new_w, new_h)) = scaled_dimensions(width, height) {
            debug!("Downscaling image {}x{} → {}x{}", width, height, new_w, new_h);
            rgb = imageops::resize(&rgb, new_w, new_h, FilterType::Lanczos3);
        }

        let rgb = enhance_contrast(&rgb, CONTRAST_FACTOR);
        let rgb = enhance_sharpness(&rgb, SHARPNESS_FACTOR);
        let rgb = imageops::blur(&rgb, DENOISE_SIGMA);

        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb.write_with_encoder(encoder).map_err(|e| ProcessError::Io {
            detail: format!("JPEG encoding failed: {e}"),
        })?;
        debug!("Preprocessed image → {} JPEG bytes", out.len());
        Ok(out)
    }
}

/// `Some((w, h))` when the longer edge exceeds [`MAX_EDGE`], else `None`.
///
/// Both dimensions scale by `MAX_EDGE / longer_edge`, rounded to nearest and
/// clamped to at least one pixel.
fn scaled_dimensions(width: u32, height: u32) -> Option<(u32, u32)> {
    let longer = width.max(height);
    if longer <= MAX_EDGE {
        return None;
    }
    let ratio = MAX_EDGE as f64 / longer as f64;
    let w = ((width as f64 * ratio).round() as u32).max(1);
    let h = ((height as f64 * ratio).round() as u32).max(1);
    Some((w, h))
}

/// Contrast enhancement: extrapolate each channel away from the image's
/// rounded mean luminance. Factor 1.0 is the identity.
fn enhance_contrast(img: &RgbImage, factor: f32) -> RgbImage {
    let mean = mean_luminance(img);
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = extrapolate(mean, f32::from(*channel), factor);
        }
    }
    out
}

/// Sharpness enhancement: extrapolate each channel away from a 3×3-smoothed
/// copy of the image. Factor 1.0 is the identity.
fn enhance_sharpness(img: &RgbImage, factor: f32) -> RgbImage {
    let smoothed = smooth_3x3(img);
    let mut out = img.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let soft = smoothed.get_pixel(x, y);
        for (c, channel) in pixel.0.iter_mut().enumerate() {
            *channel = extrapolate(f32::from(soft.0[c]), f32::from(*channel), factor);
        }
    }
    out
}

/// Rounded mean of the integer ITU-R 601 luma over all pixels.
fn mean_luminance(img: &RgbImage) -> f32 {
    let mut sum: u64 = 0;
    for pixel in img.pixels() {
        let [r, g, b] = pixel.0;
        sum += (19595 * u64::from(r) + 38470 * u64::from(g) + 7471 * u64::from(b)) >> 16;
    }
    let count = (u64::from(img.width()) * u64::from(img.height())).max(1);
    ((sum as f64) / (count as f64)).round() as f32
}

/// `base + factor × (value − base)`, clamped to the u8 range.
fn extrapolate(base: f32, value: f32, factor: f32) -> u8 {
    (base + factor * (value - base)).clamp(0.0, 255.0) as u8
}

/// Weighted 3×3 smoothing, kernel `[1 1 1; 1 5 1; 1 1 1] / 13`.
///
/// Border pixels are copied from the source unchanged, matching the edge
/// handling of the classic convolution this reproduces.
fn smooth_3x3(img: &RgbImage) -> RgbImage {
    const KERNEL: [[f32; 3]; 3] = [[1.0, 1.0, 1.0], [1.0, 5.0, 1.0], [1.0, 1.0, 1.0]];
    const KERNEL_SUM: f32 = 13.0;

    let (width, height) = img.dimensions();
    let mut out = img.clone();
    if width < 3 || height < 3 {
        return out;
    }
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut smoothed = [0u8; 3];
            for (c, slot) in smoothed.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for ky in 0..3u32 {
                    for kx in 0..3u32 {
                        let p = img.get_pixel(x + kx - 1, y + ky - 1);
                        acc += KERNEL[ky as usize][kx as usize] * f32::from(p.0[c]);
                    }
                }
                *slot = (acc / KERNEL_SUM).round() as u8;
            }
            out.put_pixel(x, y, Rgb(smoothed));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{DynamicImage, ImageFormat};

    fn png_bytes(img: &RgbImage) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn scaling_only_above_max_edge() {
        assert_eq!(scaled_dimensions(2000, 500), Some((1024, 256)));
        assert_eq!(scaled_dimensions(500, 2000), Some((256, 1024)));
        assert_eq!(scaled_dimensions(1024, 768), None);
        assert_eq!(scaled_dimensions(1, 1), None);
    }

    #[test]
    fn scaling_never_reaches_zero() {
        assert_eq!(scaled_dimensions(5000, 1), Some((1024, 1)));
        assert_eq!(scaled_dimensions(3000, 10), Some((1024, 3)));
    }

    #[test]
    fn large_image_lands_on_rounded_dimensions() {
        let bytes = png_bytes(&gradient(2000, 500));
        let jpeg = ImagePreprocessor::new().preprocess(&bytes).unwrap();
        let out = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((out.width(), out.height()), (1024, 256));
    }

    #[test]
    fn small_image_keeps_resolution() {
        let bytes = png_bytes(&gradient(100, 50));
        let jpeg = ImagePreprocessor::new().preprocess(&bytes).unwrap();
        let out = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((out.width(), out.height()), (100, 50));
    }

    #[test]
    fn output_is_jpeg() {
        let bytes = png_bytes(&gradient(32, 32));
        let jpeg = ImagePreprocessor::new().preprocess(&bytes).unwrap();
        assert_eq!(&jpeg[..2], &[0xff, 0xd8], "missing JPEG SOI marker");
    }

    #[test]
    fn preprocessing_is_deterministic() {
        let bytes = png_bytes(&gradient(64, 48));
        let first = ImagePreprocessor::new().preprocess(&bytes).unwrap();
        let second = ImagePreprocessor::new().preprocess(&bytes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn garbage_bytes_fail_with_decode() {
        let err = ImagePreprocessor::new()
            .preprocess(b"not an image at all")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn enhancement_is_identity_on_flat_field() {
        let flat = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        let contrasted = enhance_contrast(&flat, CONTRAST_FACTOR);
        assert_eq!(contrasted.get_pixel(5, 5), &Rgb([128, 128, 128]));
        let sharpened = enhance_sharpness(&flat, SHARPNESS_FACTOR);
        assert_eq!(sharpened.get_pixel(5, 5), &Rgb([128, 128, 128]));
    }

    #[test]
    fn contrast_pushes_channels_apart() {
        // Half dark, half bright: factor 1.2 must widen the spread.
        let img = RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([50, 50, 50])
            } else {
                Rgb([200, 200, 200])
            }
        });
        let out = enhance_contrast(&img, CONTRAST_FACTOR);
        assert!(out.get_pixel(0, 0).0[0] < 50);
        assert!(out.get_pixel(3, 0).0[0] > 200);
    }
}
