//! SignSlot Render Library
//!
//! Native decoding of signature images. Signatures arrive as `data:` URIs;
//! [`DataUriLoader`] turns them into RGBA buffers for the core compositor.

mod data_uri;
mod decode;
mod loader;

pub use data_uri::{DataUri, DataUriError};
pub use decode::{DecodedImage, decode_bytes, decode_data_uri};
pub use loader::DataUriLoader;
