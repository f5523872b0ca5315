// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod extract;
pub mod pipeline;
pub mod vision;

pub use api::{build_router, start_server, ApiError, AppState};
pub use config::NodeConfig;
pub use pipeline::{AadhaarRecord, BackSideRecord, CardPipeline};
pub use vision::{
    DetectionBox, FieldLabel, LabelMap, RegionDetector, TesseractRecognizer, TextRecognizer,
    YoloRegionDetector,
};
