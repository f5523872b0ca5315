// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text recognizer collaborator: Tesseract OCR behind a trait seam

use anyhow::{anyhow, Result};
use image::{DynamicImage, ImageFormat};
use tesseract::Tesseract;
use tracing::debug;

/// Page segmentation mode 6: treat the crop as a single uniform block of
/// text. Field crops are multi-word blocks, not single lines; this default
/// must be preserved, it measurably changes recognition accuracy.
const PAGE_SEG_MODE: &str = "6";

/// OCR collaborator seam. The production impl shells into Tesseract; tests
/// script this trait directly.
pub trait TextRecognizer: Send + Sync {
    /// Convert an image into raw recognized text.
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

/// Tesseract-backed recognizer using the English language model.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    /// Optional TESSDATA_PREFIX override for the trained-data directory
    datapath: Option<String>,
    language: String,
}

impl TesseractRecognizer {
    pub fn new(datapath: Option<String>, language: impl Into<String>) -> Self {
        Self {
            datapath,
            language: language.into(),
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(None, "eng")
    }
}

impl TextRecognizer for TesseractRecognizer {
    /// Runs Tesseract over the image via a scoped temp file.
    ///
    /// Crops are always written as PNG regardless of the source container
    /// format. The temp file is removed on drop, on the error paths too.
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let tmp = tempfile::Builder::new()
            .prefix("aadhaar-crop-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| anyhow!("failed to create temp crop file: {e}"))?;

        image
            .save_with_format(tmp.path(), ImageFormat::Png)
            .map_err(|e| anyhow!("failed to write crop: {e}"))?;

        let crop_path = tmp
            .path()
            .to_str()
            .ok_or_else(|| anyhow!("temp crop path is not valid UTF-8"))?;

        let mut tess = Tesseract::new(self.datapath.as_deref(), Some(&self.language))
            .map_err(|e| anyhow!("tesseract init failed: {e}"))?
            .set_variable("tessedit_pageseg_mode", PAGE_SEG_MODE)
            .map_err(|e| anyhow!("tesseract configuration failed: {e}"))?
            .set_image(crop_path)
            .map_err(|e| anyhow!("tesseract could not read crop: {e}"))?;

        let text = tess
            .get_text()
            .map_err(|e| anyhow!("tesseract recognition failed: {e}"))?;

        debug!("OCR produced {} chars", text.len());

        Ok(text)
    }
}
