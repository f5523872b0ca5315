// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Card pipeline: detect regions, crop, OCR, normalize, assemble the record

use anyhow::Result;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::extract;
use crate::vision::{
    preprocess_for_bold_text, DetectionBox, FieldLabel, RegionDetector, TextRecognizer,
};

/// Fixed-shape front-side result. All five keys are always present; fields
/// for undetected or unreadable regions stay at their empty-string default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AadhaarRecord {
    #[serde(rename = "aadharNo")]
    pub aadhaar_number: String,
    pub name: String,
    pub dob: String,
    pub gender: String,
    pub address: String,
}

impl AadhaarRecord {
    fn set(&mut self, label: FieldLabel, value: String) {
        match label {
            FieldLabel::AadhaarNumber => self.aadhaar_number = value,
            FieldLabel::DateOfBirth => self.dob = value,
            FieldLabel::Gender => self.gender = value,
            FieldLabel::Name => self.name = value,
            FieldLabel::Address => self.address = value,
            // No front-side detector class exists for the father's name;
            // it is handled by the back-side path only.
            FieldLabel::FathersName => {}
        }
    }
}

/// Back-side result: the relation line and the address block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackSideRecord {
    pub fathers_name: String,
    pub address: String,
}

/// The request pipeline: detector and recognizer collaborators injected at
/// construction, held for the process lifetime. Each request runs the
/// detect, crop, OCR, normalize chain sequentially with no internal
/// parallelism.
pub struct CardPipeline {
    detector: Arc<dyn RegionDetector>,
    recognizer: Arc<dyn TextRecognizer>,
}

impl CardPipeline {
    pub fn new(detector: Arc<dyn RegionDetector>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    /// Front-of-card extraction: detector + recognizer.
    ///
    /// Detection or a completely unusable image is a hard error; a failed
    /// OCR run on an individual crop is logged and leaves that one field
    /// empty. Duplicate labels resolve last-write-wins in detector order.
    pub fn process_front(&self, image: &DynamicImage) -> Result<AadhaarRecord> {
        let boxes = self.detector.detect(image)?;
        debug!("Processing {} detected regions", boxes.len());

        let mut record = AadhaarRecord::default();

        for bbox in &boxes {
            let Some(crop) = crop_region(image, bbox) else {
                warn!("Skipping degenerate region for {:?}", bbox.label);
                continue;
            };

            let raw = match self.recognizer.recognize(&crop) {
                Ok(text) => text.replace('\n', " ").trim().to_string(),
                Err(e) => {
                    warn!("OCR failed for {:?} region: {e}", bbox.label);
                    continue;
                }
            };

            debug!("{:?}: {raw}", bbox.label);
            record.set(bbox.label, normalize_field(bbox.label, &raw));
        }

        Ok(record)
    }

    /// Back-of-card extraction: recognizer only, no detector involved.
    ///
    /// OCR runs over the whole image; `preprocess` routes it through the
    /// bold-text filter first.
    pub fn process_back(&self, image: &DynamicImage, preprocess: bool) -> Result<BackSideRecord> {
        let raw = if preprocess {
            let filtered = DynamicImage::ImageLuma8(preprocess_for_bold_text(image));
            self.recognizer.recognize(&filtered)?
        } else {
            self.recognizer.recognize(image)?
        };

        Ok(BackSideRecord {
            fathers_name: extract::extract_fathers_name(&raw),
            address: extract::extract_address(&raw),
        })
    }
}

/// Crop a detected region out of the source image.
///
/// Box coordinates are already clipped to image bounds by the detector;
/// zero-area rects yield `None`.
fn crop_region(image: &DynamicImage, bbox: &DetectionBox) -> Option<DynamicImage> {
    let width = bbox.width();
    let height = bbox.height();
    if width == 0 || height == 0 {
        return None;
    }
    Some(image.crop_imm(bbox.x_min, bbox.y_min, width, height))
}

/// Route one region's raw OCR text through its field extractor.
fn normalize_field(label: FieldLabel, raw: &str) -> String {
    match label {
        FieldLabel::AadhaarNumber => extract::extract_aadhaar_number(raw),
        FieldLabel::Name => extract::extract_name(raw),
        FieldLabel::Gender => extract::extract_gender(raw),
        FieldLabel::Address => extract::extract_address(raw),
        FieldLabel::FathersName => extract::extract_fathers_name(raw),
        FieldLabel::DateOfBirth => {
            let dob = extract::extract_date_of_birth(raw);
            if dob.is_empty() {
                // Year-only cards: fall back to the standalone year token.
                extract::extract_year_of_birth(raw)
            } else {
                dob
            }
        }
    }
}
