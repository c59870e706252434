//! Decoding signature images into RGBA buffers.

use crate::data_uri::{DataUri, DataUriError};
use std::rc::Rc;

/// A decoded signature image. Clones share the pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels.
    pub pixels: Rc<Vec<u8>>,
}

impl DecodedImage {
    /// RGBA value at `(x, y)`, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        let px = self.pixels.get(offset..offset + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Decode raw PNG/JPEG/WebP bytes.
pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, DataUriError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: Rc::new(rgba.into_vec()),
    })
}

/// Decode an image carried in a `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<DecodedImage, DataUriError> {
    let parsed = DataUri::parse(uri)?;
    if !parsed.is_image() {
        return Err(DataUriError::UnsupportedMediaType(parsed.mime));
    }
    let decoded = decode_bytes(&parsed.data)?;
    log::debug!("decoded {} signature {}x{}", parsed.mime, decoded.width, decoded.height);
    Ok(decoded)
}
