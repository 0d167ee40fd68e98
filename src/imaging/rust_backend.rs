//! Pure Rust codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff format | `image::guess_format` (magic bytes) |
//! | Decode (JPEG, PNG, WebP) | `image::ImageReader` with guessed format |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha flattened onto black) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::backend::{CodecError, ImageCodec};
use super::params::{EncodeParams, OutputFormat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbaImage};
use std::sync::LazyLock;

/// Upload MIME types whose decoders are compiled in.
const UPLOAD_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("image/jpeg", ImageFormat::Jpeg),
    ("image/png", ImageFormat::Png),
    ("image/webp", ImageFormat::WebP),
];

static SUPPORTED_MIME_TYPES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    UPLOAD_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(mime, _)| *mime)
        .collect()
});

/// MIME types the codec can decode.
pub fn supported_input_mime_types() -> &'static [&'static str] {
    &SUPPORTED_MIME_TYPES
}

/// MIME type of a payload judged by its magic bytes, if recognised.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

/// Codec using the `image` crate ecosystem.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Composite straight-alpha RGBA onto opaque black, the way a canvas
/// exports to a format without alpha.
fn flatten_onto_black(image: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((image.width() * image.height() * 3) as usize);
    for px in image.pixels() {
        let a = px[3] as u32;
        for c in &px.0[..3] {
            rgb.push(((*c as u32 * a + 127) / 255) as u8);
        }
    }
    rgb
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, CodecError> {
        let reader = ImageReader::new(std::io::Cursor::new(bytes))
            .with_guessed_format()
            .map_err(CodecError::Io)?;
        let format = reader.format();
        let img = reader.decode().map_err(|e| {
            CodecError::DecodeFailed(format!("Failed to decode {format:?} payload: {e}"))
        })?;
        Ok(img.to_rgba8())
    }

    fn encode(&self, image: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let (width, height) = image.dimensions();
        let mut buf = Vec::new();
        match params.format {
            OutputFormat::Jpeg => {
                let rgb = flatten_onto_black(image);
                JpegEncoder::new_with_quality(&mut buf, params.quality.value() as u8)
                    .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| CodecError::EncodeFailed(format!("JPEG encode failed: {e}")))?;
            }
            OutputFormat::Png => {
                PngEncoder::new(&mut buf)
                    .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(|e| CodecError::EncodeFailed(format!("PNG encode failed: {e}")))?;
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use crate::test_helpers::{gradient_image, png_bytes};

    #[test]
    fn supported_mime_types_cover_upload_formats() {
        let mimes = supported_input_mime_types();
        for expected in &["image/jpeg", "image/png", "image/webp"] {
            assert!(mimes.contains(expected), "expected {expected} supported");
        }
    }

    #[test]
    fn sniff_recognises_png() {
        let bytes = png_bytes(&gradient_image(4, 4));
        assert_eq!(sniff_mime_type(&bytes), Some("image/png"));
        assert_eq!(sniff_mime_type(b"definitely not an image"), None);
    }

    #[test]
    fn decode_png_keeps_natural_size() {
        let bytes = png_bytes(&gradient_image(40, 30));
        let img = RustCodec::new().decode(&bytes).unwrap();
        assert_eq!(img.dimensions(), (40, 30));
    }

    #[test]
    fn decode_png_is_lossless() {
        let source = gradient_image(16, 16);
        let img = RustCodec::new().decode(&png_bytes(&source)).unwrap();
        assert_eq!(img, source);
    }

    #[test]
    fn decode_garbage_errors() {
        let result = RustCodec::new().decode(b"\x00\x01\x02not-an-image");
        assert!(matches!(result, Err(CodecError::DecodeFailed(_))));
    }

    #[test]
    fn encode_jpeg_roundtrips_dimensions() {
        let codec = RustCodec::new();
        let payload = codec
            .encode(&gradient_image(64, 48), &EncodeParams::jpeg(Quality::new(90)))
            .unwrap();
        assert_eq!(sniff_mime_type(&payload), Some("image/jpeg"));
        let decoded = codec.decode(&payload).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn jpeg_flattens_transparency_to_black() {
        let codec = RustCodec::new();
        let transparent = RgbaImage::from_pixel(16, 16, image::Rgba([255, 255, 255, 0]));
        let payload = codec
            .encode(&transparent, &EncodeParams::jpeg(Quality::new(95)))
            .unwrap();
        let decoded = codec.decode(&payload).unwrap();
        let px = decoded.get_pixel(8, 8);
        assert!(px[0] < 8 && px[1] < 8 && px[2] < 8, "got {px:?}");
        assert_eq!(px[3], 255);
    }

    #[test]
    fn encode_png_preserves_alpha() {
        let codec = RustCodec::new();
        let source = RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 40]));
        let params = EncodeParams {
            format: OutputFormat::Png,
            quality: Quality::default(),
        };
        let payload = codec.encode(&source, &params).unwrap();
        assert_eq!(codec.decode(&payload).unwrap(), source);
    }
}
