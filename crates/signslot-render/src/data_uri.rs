//! `data:` URI parsing.

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

/// Errors from parsing or decoding a data URI.
#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("Not a data URI")]
    MissingScheme,
    #[error("Data URI has no payload separator")]
    MissingComma,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// A parsed data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Media type, `text/plain` when the URI omits it.
    pub mime: String,
    /// Whether the payload was base64 encoded.
    pub base64: bool,
    /// Decoded payload bytes.
    pub data: Vec<u8>,
}

impl DataUri {
    /// Parse `data:[<mediatype>][;base64],<data>`.
    pub fn parse(uri: &str) -> Result<Self, DataUriError> {
        let rest = uri
            .strip_prefix("data:")
            .or_else(|| uri.strip_prefix("DATA:"))
            .ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingComma)?;

        let mut params = header.split(';');
        let mime = params
            .next()
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .unwrap_or("text/plain")
            .to_ascii_lowercase();
        let base64 = params.any(|param| param.trim().eq_ignore_ascii_case("base64"));

        let data = if base64 {
            let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            STANDARD.decode(cleaned)?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(Self { mime, base64, data })
    }

    /// Whether the media type is an image.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}
