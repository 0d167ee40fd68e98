//! Upload validation at the boundary.
//!
//! A [`ValidatedUpload`] is the only thing the edit session accepts, so a
//! payload that is not an image, is empty, is too large, or is in a format
//! the codec cannot read never reaches decode or render.

use crate::config::ImageConfig;
use crate::imaging::{sniff_mime_type, supported_input_mime_types};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload an image file (got {0})")]
    NotAnImage(String),
    #[error("The file is empty")]
    Empty,
    #[error("The file is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
}

/// Limits applied to every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_size: u64,
    pub supported_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self::from(&ImageConfig::default())
    }
}

impl From<&ImageConfig> for UploadLimits {
    fn from(config: &ImageConfig) -> Self {
        Self {
            max_size: config.max_size,
            supported_types: config.supported_types.clone(),
        }
    }
}

/// Upload bytes that passed validation, tagged with their sniffed MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    bytes: Vec<u8>,
    mime_type: &'static str,
}

impl ValidatedUpload {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check an upload against `limits`.
///
/// `declared_mime` is the type the sender claimed (a browser's `File.type`);
/// when present it must start with `image/`. The content is then sniffed,
/// and the sniffed type must be both configured and decodable.
pub fn validate_upload(
    bytes: Vec<u8>,
    declared_mime: Option<&str>,
    limits: &UploadLimits,
) -> Result<ValidatedUpload, UploadError> {
    if let Some(declared) = declared_mime
        && !declared.starts_with("image/")
    {
        return Err(UploadError::NotAnImage(declared.to_string()));
    }
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    let size = bytes.len() as u64;
    if size > limits.max_size {
        return Err(UploadError::TooLarge {
            size,
            limit: limits.max_size,
        });
    }

    let mime_type = sniff_mime_type(&bytes).ok_or_else(|| {
        UploadError::UnsupportedFormat(declared_mime.unwrap_or("unknown").to_string())
    })?;
    let configured = limits.supported_types.iter().any(|t| t == mime_type);
    if !configured || !supported_input_mime_types().contains(&mime_type) {
        return Err(UploadError::UnsupportedFormat(mime_type.to_string()));
    }

    log::debug!("Accepted {mime_type} upload of {size} bytes");
    Ok(ValidatedUpload { bytes, mime_type })
}

/// Best-effort MIME type from a file name, the way a browser fills in
/// `File.type` for a picked file.
pub fn mime_from_extension(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => return None,
    })
}
