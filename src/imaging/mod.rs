//! Image processing: decode, filter, rotate, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with sniffed format |
//! | **Colour filters** | CSS filter matrices over an `Rgba32FImage` layer (rayon) |
//! | **Blur** | `image::imageops::blur` |
//! | **Rotate** | inverse pixel mapping about the surface centre |
//! | **Encode** | `JpegEncoder` / `PngEncoder` |
//!
//! The module is split into:
//! - **Parameters**: what an export should produce ([`EncodeParams`])
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Colour**: per-function pixel math
//! - **Surface / Pipeline**: the render target and the redraw that fills it

pub mod backend;
mod color;
mod params;
pub mod pipeline;
pub mod rust_backend;
mod surface;

pub use backend::{CodecError, Dimensions, ImageCodec};
pub use params::{EncodeParams, OutputFormat, Quality};
pub use pipeline::{filter_image, render};
pub use rust_backend::{RustCodec, sniff_mime_type, supported_input_mime_types};
pub use surface::Surface;
