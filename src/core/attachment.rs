//! Image attachment handling.
//!
//! Files from the picker are sniffed, size-checked, and decoded before
//! the prompt assembler ever sees them; the assembler only deals with a
//! validated mime type and the raw bytes. Base64 encoding happens at the
//! wire, not here.

use std::fmt;
use std::fs;
use std::path::Path;

use base64::Engine;
use image::ImageFormat;

/// Upper bound on attachment size, in bytes.
pub const MAX_ATTACHMENT_BYTES: u64 = 8 * 1024 * 1024;

const ACCEPTED_FORMATS: [ImageFormat; 4] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::WebP,
    ImageFormat::Gif,
];

#[derive(Debug)]
pub enum AttachmentError {
    Io(std::io::Error),
    TooLarge { size: u64 },
    UnsupportedFormat,
    Undecodable(String),
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::Io(err) => write!(f, "Could not read the file: {err}"),
            AttachmentError::TooLarge { size } => write!(
                f,
                "The image is {size} bytes; the limit is {MAX_ATTACHMENT_BYTES} bytes."
            ),
            AttachmentError::UnsupportedFormat => {
                write!(f, "Only JPEG, PNG, WebP, and GIF images are supported.")
            }
            AttachmentError::Undecodable(detail) => {
                write!(f, "The file is not a decodable image: {detail}")
            }
        }
    }
}

impl std::error::Error for AttachmentError {}

impl From<std::io::Error> for AttachmentError {
    fn from(err: std::io::Error) -> Self {
        AttachmentError::Io(err)
    }
}

/// A validated in-memory image ready for prompt assembly.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Attachment {
    /// Read and validate an image file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let metadata = fs::metadata(path.as_ref())?;
        if metadata.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                size: metadata.len(),
            });
        }
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(bytes)
    }

    /// Validate already-loaded bytes: sniff the format by magic bytes,
    /// reject anything outside the accepted set, and decode to prove the
    /// payload is a real image.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, AttachmentError> {
        if bytes.len() as u64 > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge {
                size: bytes.len() as u64,
            });
        }

        let format =
            image::guess_format(&bytes).map_err(|_| AttachmentError::UnsupportedFormat)?;
        if !ACCEPTED_FORMATS.contains(&format) {
            return Err(AttachmentError::UnsupportedFormat);
        }

        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|err| AttachmentError::Undecodable(err.to_string()))?;

        Ok(Self {
            mime_type: format.to_mime_type().to_string(),
            bytes,
            width: decoded.width(),
            height: decoded.height(),
        })
    }

    /// Base64 payload for the wire's `inlineData` field.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 opaque pixel, the smallest valid PNG we can embed.
    const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0xF8,
        0xCF, 0xC0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0xF7, 0x03, 0x41, 0x43, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn accepts_a_valid_png() {
        let attachment = Attachment::from_bytes(TINY_PNG.to_vec()).unwrap();
        assert_eq!(attachment.mime_type, "image/png");
        assert_eq!(attachment.width, 1);
        assert_eq!(attachment.height, 1);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let result = Attachment::from_bytes(b"just some text".to_vec());
        assert!(matches!(result, Err(AttachmentError::UnsupportedFormat)));
    }

    #[test]
    fn rejects_truncated_image_data() {
        // Valid PNG magic, garbage body.
        let mut bytes = TINY_PNG[..16].to_vec();
        bytes.extend_from_slice(&[0u8; 8]);
        let result = Attachment::from_bytes(bytes);
        assert!(matches!(result, Err(AttachmentError::Undecodable(_))));
    }

    #[test]
    fn base64_round_trips_the_raw_bytes() {
        let attachment = Attachment::from_bytes(TINY_PNG.to_vec()).unwrap();
        let encoded = attachment.to_base64();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        assert_eq!(decoded, TINY_PNG);
    }
}
