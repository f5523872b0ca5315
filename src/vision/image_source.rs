// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image acquisition: URL download, format validation and decoding

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Maximum downloaded image size (10MB)
const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Errors raised while acquiring the card image
#[derive(Debug, Error)]
pub enum ImageSourceError {
    #[error("Failed to download image: {0}")]
    Download(String),

    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Invalid image format. Only JPG and PNG are supported.")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Metadata captured while decoding the card image
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Download raw image bytes from a URL.
///
/// No retries; a failed or non-2xx download surfaces as
/// [`ImageSourceError::Download`].
pub async fn fetch_image_bytes(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<u8>, ImageSourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ImageSourceError::Download(e.to_string()))?;

    if !response.status().is_success() {
        return Err(ImageSourceError::Download(format!(
            "unexpected status {} from {}",
            response.status(),
            url
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ImageSourceError::Download(e.to_string()))?;

    Ok(bytes.to_vec())
}

/// Decode downloaded bytes into a card image.
///
/// The format check runs on magic bytes before any decoding work, so
/// unsupported formats are rejected without touching the detector or OCR.
pub fn decode_card_image(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), ImageSourceError> {
    if bytes.is_empty() {
        return Err(ImageSourceError::EmptyData);
    }

    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageSourceError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageSourceError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img, info))
}

/// Detect the image format from magic bytes.
///
/// Only JPEG and PNG cards are accepted; everything else (GIF, WebP, BMP,
/// garbage) maps to [`ImageSourceError::UnsupportedFormat`].
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageSourceError> {
    if bytes.len() < 4 {
        return Err(ImageSourceError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        _ => Err(ImageSourceError::UnsupportedFormat),
    }
}
