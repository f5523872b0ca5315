// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use std::env;
use std::sync::Arc;

use aadhaar_ocr_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    pipeline::CardPipeline,
    vision::{LabelMap, TesseractRecognizer, YoloRegionDetector},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = NodeConfig::from_env();
    tracing::info!("Starting Aadhaar OCR node on port {}", config.api_port);

    // The detection model loads once here and lives for the process; the
    // label table is checked against the class count before serving anything.
    let detector = YoloRegionDetector::new(
        &config.detector_model_path,
        LabelMap::front(),
        config.detector_classes,
    )
    .await?
    .with_confidence_threshold(config.detector_confidence);

    let recognizer =
        TesseractRecognizer::new(config.tessdata_prefix.clone(), config.ocr_language.clone());

    let pipeline = Arc::new(CardPipeline::new(
        Arc::new(detector),
        Arc::new(recognizer),
    ));

    let state = AppState::new(pipeline);
    start_server(state, config.api_port).await
}
