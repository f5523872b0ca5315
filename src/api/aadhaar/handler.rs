// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Aadhaar OCR endpoint handlers

use axum::extract::State;
use axum::Json;
use tracing::{debug, info, warn};

use super::request::{AadhaarOcrRequest, BackSideOcrRequest};
use super::response::{AadhaarOcrResponse, BackSideOcrResponse};
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_card_image, fetch_image_bytes};

/// POST /aadhaarOcr - extract the front-side fields from a card image URL
///
/// # Request
/// - `imgUrl`: URL of the card image (required; JPEG or PNG)
///
/// # Response
/// - `extractedData`: `{aadharNo, name, dob, gender, address}`, each a
///   best-effort string, empty when the field could not be read
///
/// # Errors
/// - 400: missing URL, or the downloaded content is not JPEG/PNG
/// - 500: download, decode or detector failure
pub async fn aadhaar_ocr_handler(
    State(state): State<AppState>,
    Json(request): Json<AadhaarOcrRequest>,
) -> Result<Json<AadhaarOcrResponse>, ApiError> {
    request.validate().map_err(|e| {
        warn!("Aadhaar OCR validation failed: {e}");
        e
    })?;

    debug!("Aadhaar OCR request for {}", request.img_url);

    let bytes = fetch_image_bytes(&state.http, &request.img_url).await?;
    let (image, image_info) = decode_card_image(&bytes)?;

    debug!(
        "Decoded {}x{} {:?} card image, {} bytes",
        image_info.width, image_info.height, image_info.format, image_info.size_bytes
    );

    let record = state.pipeline.process_front(&image)?;

    info!(
        "Front extraction complete (aadhaar: {}, name: {}, dob: {}, gender: {}, address: {})",
        !record.aadhaar_number.is_empty(),
        !record.name.is_empty(),
        !record.dob.is_empty(),
        !record.gender.is_empty(),
        !record.address.is_empty(),
    );

    Ok(Json(AadhaarOcrResponse::new(record)))
}

/// POST /aadhaarOcr/back - extract father's name and address from the back
/// side of the card
///
/// No region detection runs on this path; OCR covers the whole image,
/// optionally after the bold-text filter (`preprocess: true`).
pub async fn back_side_handler(
    State(state): State<AppState>,
    Json(request): Json<BackSideOcrRequest>,
) -> Result<Json<BackSideOcrResponse>, ApiError> {
    request.validate().map_err(|e| {
        warn!("Back-side OCR validation failed: {e}");
        e
    })?;

    debug!("Back-side OCR request for {}", request.img_url);

    let bytes = fetch_image_bytes(&state.http, &request.img_url).await?;
    let (image, _info) = decode_card_image(&bytes)?;

    let record = state.pipeline.process_back(&image, request.preprocess)?;

    info!(
        "Back extraction complete (fathersName: {}, address: {})",
        !record.fathers_name.is_empty(),
        !record.address.is_empty(),
    );

    Ok(Json(BackSideOcrResponse::new(record)))
}
