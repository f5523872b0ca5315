// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Aadhaar OCR endpoint module
//!
//! Provides POST /aadhaarOcr (front side, detector + OCR) and
//! POST /aadhaarOcr/back (back side, OCR only).

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{aadhaar_ocr_handler, back_side_handler};
pub use request::{AadhaarOcrRequest, BackSideOcrRequest};
pub use response::{AadhaarOcrResponse, BackSideOcrResponse};
