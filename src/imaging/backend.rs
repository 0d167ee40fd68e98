//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait defines the two operations the editor needs from a
//! codec: decode an uploaded payload into an RGBA bitmap, and encode a
//! rendered surface into an exportable payload.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec), built on the `image` crate.

use super::params::EncodeParams;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    DecodeFailed(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}

/// Pixel dimensions of a bitmap or surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Trait for image codecs.
///
/// `Sync` so a decode can be handed to another thread while the controller
/// keeps a reference.
pub trait ImageCodec: Sync {
    /// Decode an encoded payload into its natural-size RGBA bitmap.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, CodecError>;

    /// Encode a bitmap into a payload in the requested format.
    fn encode(&self, image: &RgbaImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError>;
}
