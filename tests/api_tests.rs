// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Router-level tests with scripted collaborators and a local image host

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use image::{DynamicImage, ImageFormat};
use tower::ServiceExt;

use aadhaar_ocr_node::{
    AppState, CardPipeline, DetectionBox, FieldLabel, RegionDetector, TextRecognizer,
};

struct CountingDetector {
    boxes: Vec<DetectionBox>,
    calls: Arc<AtomicUsize>,
}

impl RegionDetector for CountingDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<DetectionBox>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.boxes.clone())
    }
}

struct FailingDetector;

impl RegionDetector for FailingDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<Vec<DetectionBox>> {
        anyhow::bail!("inference session died")
    }
}

struct CountingRecognizer {
    outputs: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl TextRecognizer for CountingRecognizer {
    fn recognize(&self, _image: &DynamicImage) -> Result<String> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outputs.get(i).cloned().unwrap_or_default())
    }
}

fn bbox(label: FieldLabel, y: u32) -> DetectionBox {
    DetectionBox {
        x_min: 5,
        y_min: y,
        x_max: 95,
        y_max: y + 20,
        label,
        confidence: 0.9,
    }
}

fn png_card() -> Vec<u8> {
    let img = DynamicImage::new_rgb8(100, 200);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

const GIF_BYTES: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xFF, 0xFF,
    0xFF, 0x00, 0x00, 0x00, 0x3B,
];

/// Serve fixed bytes from an ephemeral local port and return the URL.
async fn host_image(bytes: Vec<u8>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().route(
        "/card",
        get(move || {
            let bytes = bytes.clone();
            async move { bytes }
        }),
    );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/card")
}

fn app_with(
    detector: Arc<dyn RegionDetector>,
    recognizer: Arc<dyn TextRecognizer>,
) -> axum::Router {
    let pipeline = Arc::new(CardPipeline::new(detector, recognizer));
    aadhaar_ocr_node::build_router(AppState::new(pipeline))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_img_url_is_rejected_before_any_work() {
    let detector_calls = Arc::new(AtomicUsize::new(0));
    let app = app_with(
        Arc::new(CountingDetector {
            boxes: vec![],
            calls: detector_calls.clone(),
        }),
        Arc::new(CountingRecognizer {
            outputs: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    let response = app
        .oneshot(post_json("/aadhaarOcr", serde_json::json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Image URL is required");
    assert_eq!(detector_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_gif_rejected_without_invoking_collaborators() {
    let detector_calls = Arc::new(AtomicUsize::new(0));
    let recognizer_calls = Arc::new(AtomicUsize::new(0));
    let app = app_with(
        Arc::new(CountingDetector {
            boxes: vec![bbox(FieldLabel::Name, 0)],
            calls: detector_calls.clone(),
        }),
        Arc::new(CountingRecognizer {
            outputs: vec!["Ravi Shankar".into()],
            calls: recognizer_calls.clone(),
        }),
    );

    let url = host_image(GIF_BYTES.to_vec()).await;
    let response = app
        .oneshot(post_json("/aadhaarOcr", serde_json::json!({ "imgUrl": url })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Invalid image format. Only JPG and PNG are supported."
    );
    assert_eq!(detector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(recognizer_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_front_extraction_end_to_end() {
    let app = app_with(
        Arc::new(CountingDetector {
            boxes: vec![
                bbox(FieldLabel::Name, 0),
                bbox(FieldLabel::DateOfBirth, 30),
                bbox(FieldLabel::Gender, 60),
                bbox(FieldLabel::AadhaarNumber, 90),
                bbox(FieldLabel::Address, 120),
            ],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        Arc::new(CountingRecognizer {
            outputs: vec![
                "Government of India Ravi Shankar".into(),
                "DOB: 15/08/1999".into(),
                "MALE".into(),
                "1234 5678 9012".into(),
                "Address: 12 MG Road Pune 411001".into(),
            ],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    let url = host_image(png_card()).await;
    let response = app
        .oneshot(post_json("/aadhaarOcr", serde_json::json!({ "imgUrl": url })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let data = &body["extractedData"];
    assert_eq!(data["name"], "Ravi Shankar");
    assert_eq!(data["dob"], "15/08/1999");
    assert_eq!(data["gender"], "Male");
    assert_eq!(data["aadharNo"], "123456789012");
    assert_eq!(data["address"], "12 MG Road Pune 411001");
}

#[tokio::test]
async fn test_front_response_keeps_all_keys_when_nothing_detected() {
    let app = app_with(
        Arc::new(CountingDetector {
            boxes: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        Arc::new(CountingRecognizer {
            outputs: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    let url = host_image(png_card()).await;
    let response = app
        .oneshot(post_json("/aadhaarOcr", serde_json::json!({ "imgUrl": url })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    for key in ["aadharNo", "name", "dob", "gender", "address"] {
        assert_eq!(body["extractedData"][key], "");
    }
}

#[tokio::test]
async fn test_detector_failure_maps_to_500() {
    let app = app_with(
        Arc::new(FailingDetector),
        Arc::new(CountingRecognizer {
            outputs: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    let url = host_image(png_card()).await;
    let response = app
        .oneshot(post_json("/aadhaarOcr", serde_json::json!({ "imgUrl": url })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("inference session died"));
}

#[tokio::test]
async fn test_unreachable_url_maps_to_500() {
    let app = app_with(
        Arc::new(CountingDetector {
            boxes: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        Arc::new(CountingRecognizer {
            outputs: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    // Port 1 on loopback, nothing listens there.
    let response = app
        .oneshot(post_json(
            "/aadhaarOcr",
            serde_json::json!({ "imgUrl": "http://127.0.0.1:1/card" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn test_back_side_extraction() {
    let detector_calls = Arc::new(AtomicUsize::new(0));
    let app = app_with(
        Arc::new(CountingDetector {
            boxes: vec![],
            calls: detector_calls.clone(),
        }),
        Arc::new(CountingRecognizer {
            outputs: vec!["S/O: Shyam Lal\nAddress: H.No 5 Flat 12 Gurgaon 122001".into()],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    let url = host_image(png_card()).await;
    let response = app
        .oneshot(post_json(
            "/aadhaarOcr/back",
            serde_json::json!({ "imgUrl": url }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["extractedData"]["fathersName"], "Shyam Lal");
    assert_eq!(
        body["extractedData"]["address"],
        "H.No 5 Flat 12 Gurgaon 122001"
    );
    // Back side never touches the detector.
    assert_eq!(detector_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app_with(
        Arc::new(CountingDetector {
            boxes: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        Arc::new(CountingRecognizer {
            outputs: vec![],
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
