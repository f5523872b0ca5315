// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Environment-driven service configuration

use std::env;

/// Runtime configuration, assembled once at startup from the environment.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// HTTP listen port (`API_PORT`, default 3000)
    pub api_port: u16,
    /// Path to the field-detection ONNX model (`DETECTOR_MODEL_PATH`)
    pub detector_model_path: String,
    /// Class count the detector was trained with (`DETECTOR_CLASSES`)
    pub detector_classes: usize,
    /// Detection confidence threshold (`DETECTOR_CONFIDENCE`)
    pub detector_confidence: f32,
    /// Optional Tesseract trained-data directory (`TESSDATA_PREFIX`)
    pub tessdata_prefix: Option<String>,
    /// OCR language model (`OCR_LANGUAGE`, default "eng")
    pub ocr_language: String,
}

impl NodeConfig {
    pub fn from_env() -> Self {
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);

        let detector_model_path = env::var("DETECTOR_MODEL_PATH")
            .unwrap_or_else(|_| "./models/yolov3-aadhaar.onnx".to_string());

        let detector_classes = env::var("DETECTOR_CLASSES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(5);

        let detector_confidence = env::var("DETECTOR_CONFIDENCE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.25);

        let tessdata_prefix = env::var("TESSDATA_PREFIX").ok();

        let ocr_language = env::var("OCR_LANGUAGE").unwrap_or_else(|_| "eng".to_string());

        Self {
            api_port,
            detector_model_path,
            detector_classes,
            detector_confidence,
            tessdata_prefix,
            ocr_language,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_port: 3000,
            detector_model_path: "./models/yolov3-aadhaar.onnx".to_string(),
            detector_classes: 5,
            detector_confidence: 0.25,
            tessdata_prefix: None,
            ocr_language: "eng".to_string(),
        }
    }
}
