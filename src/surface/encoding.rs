//! Raster encoding of a surface as a PNG data URL.
//!
//! The format is the one a browser canvas produces with `toDataURL()`, so
//! records written by either side can be read by the other.

use super::SurfaceError;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

/// Prefix of every raster encoding this crate writes.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encodes `image` as a `data:image/png;base64,...` URL.
pub fn encode_png_data_url(image: &RgbaImage) -> Result<String, SurfaceError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| SurfaceError::Encode(e.to_string()))?;
    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, BASE64_STANDARD.encode(bytes)))
}

/// Decodes a `data:image/*;base64,...` URL into RGBA pixels.
pub fn decode_data_url(data: &str) -> Result<RgbaImage, SurfaceError> {
    let payload = split_data_url(data.trim())
        .ok_or_else(|| SurfaceError::Decode("not a base64 image data URL".to_string()))?;
    let bytes = BASE64_STANDARD.decode(payload)?;
    let image =
        image::load_from_memory(&bytes).map_err(|e| SurfaceError::Decode(e.to_string()))?;
    Ok(image.to_rgba8())
}

fn split_data_url(data: &str) -> Option<&str> {
    let (header, payload) = data.strip_prefix("data:")?.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;
    media_type.starts_with("image/").then_some(payload)
}
