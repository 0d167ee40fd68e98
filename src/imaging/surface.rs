//! The render target: an in-memory RGBA surface standing in for a canvas.

use super::backend::Dimensions;
use image::{Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A resizable RGBA pixel surface.
///
/// Resizing discards the previous contents, as resizing a canvas does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.pixels)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.width() == 0 || self.pixels.height() == 0
    }

    /// Match the given size, reallocating (and so clearing) only when it changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    /// Set every pixel to transparent black.
    pub fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = TRANSPARENT;
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Take the pixels out, leaving an empty surface behind.
    pub fn take(&mut self) -> RgbaImage {
        std::mem::take(&mut self.pixels)
    }
}
