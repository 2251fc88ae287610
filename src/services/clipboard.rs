//! System clipboard access for crops.
//!
//! Crops travel as PNG data URLs inside PasteCrop; the OS clipboard wants raw
//! RGBA pixels, so both directions go through `image`.

use std::borrow::Cow;

use tracing::info;

use crate::services::crop_transform::{encode_png_data_url, load_image_from_data_url};
use crate::types::errors::ClipboardError;

/// Places the image held in `url` on the system clipboard.
pub fn copy_data_url(url: &str) -> Result<(), ClipboardError> {
    let img = load_image_from_data_url(url)
        .map_err(|e| ClipboardError::Transfer(e.to_string()))?
        .to_rgba8();
    let mut clip =
        arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
    let data = arboard::ImageData {
        width: img.width() as usize,
        height: img.height() as usize,
        bytes: Cow::Borrowed(img.as_raw()),
    };
    clip.set_image(data)
        .map_err(|e| ClipboardError::Transfer(e.to_string()))?;
    info!(width = img.width(), height = img.height(), "Copied crop to clipboard");
    Ok(())
}

/// Reads an image from the system clipboard as a PNG data URL.
pub fn read_image() -> Result<String, ClipboardError> {
    let mut clip =
        arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
    let data = clip.get_image().map_err(|e| match e {
        arboard::Error::ContentNotAvailable => ClipboardError::NoImage,
        other => ClipboardError::Transfer(other.to_string()),
    })?;
    let rgba = image::RgbaImage::from_raw(
        data.width as u32,
        data.height as u32,
        data.bytes.into_owned(),
    )
    .ok_or_else(|| ClipboardError::Transfer("clipboard image has inconsistent size".to_string()))?;
    encode_png_data_url(&image::DynamicImage::ImageRgba8(rgba))
        .map_err(|e| ClipboardError::Transfer(e.to_string()))
}
