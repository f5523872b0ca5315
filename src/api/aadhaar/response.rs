// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Aadhaar OCR response types

use serde::{Deserialize, Serialize};

use crate::pipeline::{AadhaarRecord, BackSideRecord};

/// Response from front-of-card extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AadhaarOcrResponse {
    pub extracted_data: AadhaarRecord,
}

impl AadhaarOcrResponse {
    pub fn new(extracted_data: AadhaarRecord) -> Self {
        Self { extracted_data }
    }
}

/// Response from back-of-card extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackSideOcrResponse {
    pub extracted_data: BackSideRecord,
}

impl BackSideOcrResponse {
    pub fn new(extracted_data: BackSideRecord) -> Self {
        Self { extracted_data }
    }
}
