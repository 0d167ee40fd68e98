//! Pixel math for the filter primitives.
//!
//! Work happens on a floating-point layer (`0.0..=1.0` per channel, straight
//! alpha, sRGB values) so that a chain of functions quantises once at the
//! end. Every primitive clamps its output to `[0, 1]` before the next one
//! runs. Colour primitives follow the CSS Filter Effects matrices; `blur` is
//! a Gaussian with the given standard deviation in pixels.

use crate::filter::{FilterFunction, FilterKind};
use image::{Rgba, Rgba32FImage, RgbaImage};
use rayon::prelude::*;

/// A 3×3 matrix applied to the RGB channels of each pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix([[f32; 3]; 3]);

impl ColorMatrix {
    #[rustfmt::skip]
    pub fn saturate(s: f32) -> Self {
        Self([
            [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
            [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
        ])
    }

    #[rustfmt::skip]
    pub fn grayscale(amount: f32) -> Self {
        let g = 1.0 - amount;
        Self([
            [0.2126 + 0.7874 * g, 0.7152 - 0.7152 * g, 0.0722 - 0.0722 * g],
            [0.2126 - 0.2126 * g, 0.7152 + 0.2848 * g, 0.0722 - 0.0722 * g],
            [0.2126 - 0.2126 * g, 0.7152 - 0.7152 * g, 0.0722 + 0.9278 * g],
        ])
    }

    #[rustfmt::skip]
    pub fn sepia(amount: f32) -> Self {
        let s = 1.0 - amount;
        Self([
            [0.393 + 0.607 * s, 0.769 - 0.769 * s, 0.189 - 0.189 * s],
            [0.349 - 0.349 * s, 0.686 + 0.314 * s, 0.168 - 0.168 * s],
            [0.272 - 0.272 * s, 0.534 - 0.534 * s, 0.131 + 0.869 * s],
        ])
    }

    #[rustfmt::skip]
    pub fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self([
            [
                0.213 + cos * 0.787 - sin * 0.213,
                0.715 - cos * 0.715 - sin * 0.715,
                0.072 - cos * 0.072 + sin * 0.928,
            ],
            [
                0.213 - cos * 0.213 + sin * 0.143,
                0.715 + cos * 0.285 + sin * 0.140,
                0.072 - cos * 0.072 - sin * 0.283,
            ],
            [
                0.213 - cos * 0.213 - sin * 0.787,
                0.715 - cos * 0.715 + sin * 0.715,
                0.072 + cos * 0.928 + sin * 0.072,
            ],
        ])
    }

    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let m = &self.0;
        [0, 1, 2].map(|row| m[row][0] * rgb[0] + m[row][1] * rgb[1] + m[row][2] * rgb[2])
    }
}

pub fn to_layer(image: &RgbaImage) -> Rgba32FImage {
    Rgba32FImage::from_fn(image.width(), image.height(), |x, y| {
        Rgba(image.get_pixel(x, y).0.map(|c| c as f32 / 255.0))
    })
}

pub fn quantize(layer: &Rgba32FImage) -> RgbaImage {
    RgbaImage::from_fn(layer.width(), layer.height(), |x, y| {
        Rgba(layer.get_pixel(x, y).0.map(to_u8))
    })
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Mix the filtered layer over the unmodified source with weight `t`.
///
/// `t = 0` returns the source untouched, `t = 1` the filtered layer.
pub fn mix(source: &RgbaImage, filtered: &Rgba32FImage, t: f32) -> RgbaImage {
    let t = t.clamp(0.0, 1.0);
    if t == 0.0 {
        return source.clone();
    }
    if t == 1.0 {
        return quantize(filtered);
    }
    RgbaImage::from_fn(source.width(), source.height(), |x, y| {
        let s = source.get_pixel(x, y).0;
        let f = filtered.get_pixel(x, y).0;
        Rgba(std::array::from_fn(|i| {
            to_u8((s[i] as f32 / 255.0) * (1.0 - t) + f[i] * t)
        }))
    })
}

/// Run `op` over every RGBA pixel of the layer in parallel, clamping results.
fn per_pixel(layer: &mut Rgba32FImage, op: impl Fn([f32; 4]) -> [f32; 4] + Sync) {
    layer.par_chunks_mut(4).for_each(|px| {
        let out = op([px[0], px[1], px[2], px[3]]);
        for (dst, v) in px.iter_mut().zip(out) {
            *dst = v.clamp(0.0, 1.0);
        }
    });
}

fn per_channel(layer: &mut Rgba32FImage, op: impl Fn(f32) -> f32 + Sync) {
    per_pixel(layer, |[r, g, b, a]| [op(r), op(g), op(b), a]);
}

fn with_matrix(layer: &mut Rgba32FImage, matrix: ColorMatrix) {
    per_pixel(layer, |[r, g, b, a]| {
        let [r, g, b] = matrix.apply([r, g, b]);
        [r, g, b, a]
    });
}

/// Apply one filter function to the layer.
pub fn apply_function(mut layer: Rgba32FImage, function: &FilterFunction) -> Rgba32FImage {
    let a = function.amount();
    match function.kind {
        FilterKind::Brightness => per_channel(&mut layer, |c| c * a),
        FilterKind::Contrast => per_channel(&mut layer, |c| (c - 0.5) * a + 0.5),
        FilterKind::Invert => per_channel(&mut layer, |c| a + c * (1.0 - 2.0 * a)),
        FilterKind::Saturate => with_matrix(&mut layer, ColorMatrix::saturate(a)),
        FilterKind::Grayscale => with_matrix(&mut layer, ColorMatrix::grayscale(a)),
        FilterKind::Sepia => with_matrix(&mut layer, ColorMatrix::sepia(a)),
        FilterKind::HueRotate => with_matrix(&mut layer, ColorMatrix::hue_rotate(a)),
        FilterKind::Opacity => per_pixel(&mut layer, |[r, g, b, alpha]| [r, g, b, alpha * a]),
        FilterKind::Blur => {
            if a > 0.0 {
                return image::imageops::blur(&layer, a);
            }
        }
    }
    layer
}
