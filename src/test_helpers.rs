//! Shared test utilities for the smart-photo test suite.
//!
//! Bitmap builders and measurements used by the imaging, session, and
//! gallery tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = gradient_image(32, 24);
//! let payload = png_bytes(&source);
//! assert!(average_luminance(&source) > 0.0);
//! ```

use image::{ImageEncoder, Rgba, RgbaImage};

// =========================================================================
// Bitmap builders
// =========================================================================

/// Opaque image with a distinct value in every pixel (for up to 256×256).
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(2).saturating_sub(1)) as u8,
            (y * 255 / height.max(2).saturating_sub(1)) as u8,
            ((x + y) % 256) as u8,
            255,
        ])
    })
}

/// Image filled with a single RGBA value.
pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// Opaque 100×100 pure red.
pub fn red_square() -> RgbaImage {
    solid(100, 100, [255, 0, 0, 255])
}

/// Encode to PNG bytes, the lossless upload format used throughout tests.
pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    buf
}

// =========================================================================
// Measurements
// =========================================================================

/// Rec. 709 luma of one pixel, in 0–255.
pub fn luminance(px: &Rgba<u8>) -> f32 {
    0.2126 * px[0] as f32 + 0.7152 * px[1] as f32 + 0.0722 * px[2] as f32
}

/// Mean luma over every pixel.
pub fn average_luminance(image: &RgbaImage) -> f32 {
    let count = (image.width() * image.height()).max(1) as f32;
    image.pixels().map(luminance).sum::<f32>() / count
}
