// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP server: router, shared state and startup

use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::aadhaar::{aadhaar_ocr_handler, back_side_handler};
use crate::pipeline::CardPipeline;

/// Shared per-process state: the pipeline with its once-loaded collaborators
/// and the download client. Cloned per request, contents are read-only.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CardPipeline>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(pipeline: Arc<CardPipeline>) -> Self {
        Self {
            pipeline,
            http: reqwest::Client::new(),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/aadhaarOcr", post(aadhaar_ocr_handler))
        .route("/aadhaarOcr/back", post(back_side_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn start_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Aadhaar OCR server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "aadhaar-ocr-node",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
