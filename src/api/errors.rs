// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! API error type and HTTP status mapping
//!
//! Every error serializes as `{"error": "<message>"}`. Validation and
//! unsupported-format problems are 400s raised before any model work; the
//! rest of the pipeline surfaces as 500 with the underlying message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::vision::ImageSourceError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Image URL is required")]
    MissingImageUrl,

    #[error("Invalid image format. Only JPG and PNG are supported.")]
    UnsupportedImageFormat,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingImageUrl | ApiError::UnsupportedImageFormat => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ImageSourceError> for ApiError {
    fn from(err: ImageSourceError) -> Self {
        match err {
            ImageSourceError::UnsupportedFormat => ApiError::UnsupportedImageFormat,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
