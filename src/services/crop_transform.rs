//! Crop Transform for PasteCrop.
//!
//! Maps a rectangle drawn over the displayed (scaled) image onto the image's
//! natural resolution, cuts that region out, and encodes it as a standalone
//! PNG data URL ready to be copied or recorded in history.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::services::data_url;
use crate::types::crop::{CropRect, Dimensions, PixelRegion};
use crate::types::errors::CropError;

/// MIME type of every crop this module produces.
pub const OUTPUT_MIME: &str = "image/png";

/// Share of the media width the default crop covers.
const DEFAULT_CROP_WIDTH_RATIO: f64 = 0.9;

/// Scales `rect` from displayed space into natural space using independent
/// X and Y factors.
pub fn scale_to_natural(
    rect: CropRect,
    displayed: Dimensions,
    natural: Dimensions,
) -> Result<CropRect, CropError> {
    if !displayed.is_valid() {
        return Err(CropError::InvalidDimensions(format!(
            "displayed size {}x{}",
            displayed.width, displayed.height
        )));
    }
    if !natural.is_valid() {
        return Err(CropError::InvalidDimensions(format!(
            "natural size {}x{}",
            natural.width, natural.height
        )));
    }
    let scale_x = natural.width / displayed.width;
    let scale_y = natural.height / displayed.height;
    Ok(CropRect {
        x: rect.x * scale_x,
        y: rect.y * scale_y,
        width: rect.width * scale_x,
        height: rect.height * scale_y,
    })
}

/// Clips `rect` to a `width` x `height` image and snaps it to whole pixels.
///
/// The origin is floored and the size rounded, never below one pixel and
/// never past the image edge.
pub fn snap_to_pixels(rect: CropRect, width: u32, height: u32) -> Result<PixelRegion, CropError> {
    let values = [rect.x, rect.y, rect.width, rect.height];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CropError::InvalidDimensions(format!("{:?}", rect)));
    }

    let left = rect.x.max(0.0);
    let top = rect.y.max(0.0);
    let right = (rect.x + rect.width).min(width as f64);
    let bottom = (rect.y + rect.height).min(height as f64);
    if right <= left || bottom <= top {
        return Err(CropError::EmptyRegion(format!(
            "{:?} does not overlap a {}x{} image",
            rect, width, height
        )));
    }

    let x = (left.floor() as u32).min(width.saturating_sub(1));
    let y = (top.floor() as u32).min(height.saturating_sub(1));
    let w = ((right - left).round() as u32).clamp(1, width - x);
    let h = ((bottom - top).round() as u32).clamp(1, height - y);
    Ok(PixelRegion {
        x,
        y,
        width: w,
        height: h,
    })
}

/// Produces a PNG data URL of the part of `source` selected by
/// `displayed_rect`.
///
/// `displayed` is the size the image was shown at when the rectangle was
/// drawn; `natural` is its intrinsic size.
pub fn produce_crop(
    source: &DynamicImage,
    displayed_rect: CropRect,
    displayed: Dimensions,
    natural: Dimensions,
) -> Result<String, CropError> {
    let natural_rect = scale_to_natural(displayed_rect, displayed, natural)?;
    let (width, height) = source.dimensions();
    let region = snap_to_pixels(natural_rect, width, height)?;
    debug!(
        x = region.x,
        y = region.y,
        width = region.width,
        height = region.height,
        "Cropping natural region"
    );
    let cropped = source.crop_imm(region.x, region.y, region.width, region.height);
    encode_png_data_url(&cropped)
}

/// Encodes an image as a PNG data URL.
pub fn encode_png_data_url(img: &DynamicImage) -> Result<String, CropError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CropError::Encoding(e.to_string()))?;
    if buf.is_empty() {
        return Err(CropError::Encoding("encoder produced no data".to_string()));
    }
    Ok(data_url::encode(OUTPUT_MIME, &buf))
}

/// Decodes an image held in a data URL. Non-image MIME types are rejected.
pub fn load_image_from_data_url(url: &str) -> Result<DynamicImage, CropError> {
    let decoded = data_url::parse(url)?;
    if !decoded.mime.starts_with("image/") {
        return Err(CropError::Decode(format!(
            "expected an image, got {}",
            decoded.mime
        )));
    }
    load_image_from_bytes(&decoded.data)
}

/// Decodes an image from raw file bytes, guessing the format.
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage, CropError> {
    image::load_from_memory(bytes).map_err(|e| CropError::Decode(e.to_string()))
}

/// Loads an image file. Files whose extension is not a known image format are
/// rejected before reading.
pub fn load_image_from_path<P: AsRef<Path>>(path: P) -> Result<DynamicImage, CropError> {
    let path = path.as_ref();
    ImageFormat::from_path(path)
        .map_err(|_| CropError::Decode(format!("{} is not an image file", path.display())))?;
    image::open(path).map_err(|e| CropError::Decode(format!("{}: {}", path.display(), e)))
}

/// The initial crop offered for freshly loaded media: 90% of the width at
/// `aspect` (width / height), shrunk to fit the height, centered.
///
/// A non-positive or non-finite `aspect` yields a free 90% x 90% crop.
pub fn centered_aspect_crop(media: Dimensions, aspect: f64) -> CropRect {
    let mut width = media.width * DEFAULT_CROP_WIDTH_RATIO;
    let mut height = if aspect.is_finite() && aspect > 0.0 {
        width / aspect
    } else {
        media.height * DEFAULT_CROP_WIDTH_RATIO
    };
    if height > media.height {
        height = media.height;
        width = height * aspect;
    }
    CropRect {
        x: (media.width - width) / 2.0,
        y: (media.height - height) / 2.0,
        width,
        height,
    }
}
