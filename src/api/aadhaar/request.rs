// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Aadhaar OCR request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// Request for front-of-card extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AadhaarOcrRequest {
    /// URL of the card image
    #[serde(default)]
    pub img_url: String,
}

impl AadhaarOcrRequest {
    /// Reject empty/missing URLs before any download is attempted.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.img_url.trim().is_empty() {
            return Err(ApiError::MissingImageUrl);
        }
        Ok(())
    }
}

/// Request for back-of-card extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackSideOcrRequest {
    /// URL of the card image
    #[serde(default)]
    pub img_url: String,

    /// Run the bold-text filter before OCR
    #[serde(default)]
    pub preprocess: bool,
}

impl BackSideOcrRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.img_url.trim().is_empty() {
            return Err(ApiError::MissingImageUrl);
        }
        Ok(())
    }
}
