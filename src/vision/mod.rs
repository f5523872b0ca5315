// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision plumbing for the card pipeline
//!
//! This module provides:
//! - image acquisition (URL download, format validation, decoding)
//! - the bold-text preprocessing filter and detector tensor prep
//! - the region detector and text recognizer collaborator seams

pub mod detector;
pub mod image_source;
pub mod preprocessing;
pub mod recognizer;

pub use detector::{
    DetectionBox, FieldLabel, LabelMap, RegionDetector, YoloRegionDetector, DETECTOR_INPUT_SIZE,
};
pub use image_source::{
    decode_card_image, detect_format, fetch_image_bytes, ImageInfo, ImageSourceError,
};
pub use preprocessing::{letterbox, preprocess_for_bold_text, to_detector_tensor, LetterboxInfo};
pub use recognizer::{TesseractRecognizer, TextRecognizer};
