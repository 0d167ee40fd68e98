//! The render pipeline: source bitmap + expression + rotation → surface.
//!
//! Each call is a complete redraw:
//!
//! 1. Resize the surface to the source's natural size.
//! 2. Clear it to transparent.
//! 3. Run the expression's filter chain over the source, then blend the
//!    result over the unmodified source by the trailing `opacity()` weight.
//! 4. Draw at the origin, rotated about the surface centre for this draw only.
//!
//! Rendering is deterministic: identical inputs produce bit-identical surfaces.

use super::color::{apply_function, mix, to_layer};
use super::surface::Surface;
use crate::filter::{FilterExpression, Rotation};
use image::RgbaImage;
use std::borrow::Cow;

/// Redraw `surface` from `image` with the given expression and rotation.
pub fn render(
    surface: &mut Surface,
    image: &RgbaImage,
    expression: &FilterExpression,
    rotation: Rotation,
) {
    let (width, height) = image.dimensions();
    surface.resize(width, height);
    surface.clear();

    let filtered = filter_image(image, expression);
    draw(surface, &filtered, rotation);
}

/// Apply an expression to a bitmap without drawing it anywhere.
///
/// Identity expressions borrow the source instead of copying it.
pub fn filter_image<'a>(image: &'a RgbaImage, expression: &FilterExpression) -> Cow<'a, RgbaImage> {
    if expression.is_identity() {
        return Cow::Borrowed(image);
    }
    let (chain, weight) = expression.split_blend();
    let mut layer = to_layer(image);
    for function in chain.iter().filter(|f| !f.is_identity()) {
        layer = apply_function(layer, function);
    }
    Cow::Owned(mix(image, &layer, weight))
}

/// Draw onto a freshly cleared surface of the same size as `image`.
fn draw(surface: &mut Surface, image: &RgbaImage, rotation: Rotation) {
    let target = surface.pixels_mut();
    if rotation == Rotation::None {
        target.copy_from_slice(image.as_raw());
        return;
    }
    let (width, height) = image.dimensions();
    for (x, y, px) in target.enumerate_pixels_mut() {
        if let Some((sx, sy)) = source_pixel(rotation, x, y, width, height) {
            *px = *image.get_pixel(sx, sy);
        }
    }
}

/// Inverse-map a destination pixel through a rotation about the centre.
///
/// Works in doubled coordinates so pixel centres stay integral; a centre that
/// lands on a pixel boundary (odd/even size mismatch) resolves to the pixel
/// below and to the right. Destinations that map outside the source stay
/// transparent.
fn source_pixel(rotation: Rotation, x: u32, y: u32, width: u32, height: u32) -> Option<(u32, u32)> {
    let (w, h) = (width as i64, height as i64);
    let dx = 2 * x as i64 + 1 - w;
    let dy = 2 * y as i64 + 1 - h;
    let (sx2, sy2) = match rotation {
        Rotation::None => (w + dx, h + dy),
        Rotation::Quarter => (w + dy, h - dx),
        Rotation::Half => (w - dx, h - dy),
        Rotation::ThreeQuarter => (w - dy, h + dx),
    };
    let (sx, sy) = (sx2.div_euclid(2), sy2.div_euclid(2));
    if (0..w).contains(&sx) && (0..h).contains(&sy) {
        Some((sx as u32, sy as u32))
    } else {
        None
    }
}
