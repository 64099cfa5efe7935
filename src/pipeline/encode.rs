//! Image encoding: page bitmap → base64 PNG wrapped in `ImageData`.
//!
//! Vision APIs accept images as base64 data embedded in the JSON request
//! body. PNG is lossless, which keeps small slide text legible to the model.
//! The bitmap is first resampled so its longest side is at most
//! `max_vision_pixels`; larger images cost tokens without improving layout
//! recognition.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

use crate::pipeline::render::downscale_to_fit;

/// Encode a page bitmap as a base64 PNG ready for the vision API.
///
/// `detail: "high"` asks GPT-4-class models for the full tile budget;
/// without it small captions and footers are lost.
pub fn encode_page(img: &DynamicImage, max_side: u32) -> Result<ImageData, image::ImageError> {
    let resized;
    let img = if img.width() > max_side || img.height() > max_side {
        resized = downscale_to_fit(img.clone(), max_side);
        &resized
    } else {
        img
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

/// PNG bytes of a bitmap, for embedding in the presentation package.
pub fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}
