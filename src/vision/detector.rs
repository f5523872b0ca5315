// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Region detector collaborator: pretrained field-detection model
//!
//! The production detector is a YOLO-style ONNX model that locates the
//! printed card fields and tags each box with a class index. The class index
//! to field mapping is owned here as an explicit [`LabelMap`], validated at
//! startup against the configured class count.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::ArrayViewD;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::{to_detector_tensor, LetterboxInfo};

/// Default input size for the field-detection model (YOLOv3 custom, 416x416)
pub const DETECTOR_INPUT_SIZE: u32 = 416;

/// Semantic card fields the pipeline knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLabel {
    AadhaarNumber,
    DateOfBirth,
    Gender,
    Name,
    Address,
    /// Printed on the back side only; the front-side detector has no class
    /// index for it.
    FathersName,
}

/// Ordered class-index-to-field table for a detector model.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Vec<FieldLabel>,
}

impl LabelMap {
    /// The front-of-card detector's class order:
    /// `{0: aadharNo, 1: dob, 2: gender, 3: name, 4: address}`.
    pub fn front() -> Self {
        Self {
            labels: vec![
                FieldLabel::AadhaarNumber,
                FieldLabel::DateOfBirth,
                FieldLabel::Gender,
                FieldLabel::Name,
                FieldLabel::Address,
            ],
        }
    }

    pub fn get(&self, class_index: usize) -> Option<FieldLabel> {
        self.labels.get(class_index).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Fail fast when the table disagrees with the model's class count.
    pub fn validate_class_count(&self, expected: usize) -> Result<()> {
        anyhow::ensure!(
            self.labels.len() == expected,
            "label map has {} entries but the detector expects {} classes",
            self.labels.len(),
            expected
        );
        Ok(())
    }
}

/// A detected field region in source image pixel coordinates.
#[derive(Debug, Clone)]
pub struct DetectionBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
    pub label: FieldLabel,
    pub confidence: f32,
}

impl DetectionBox {
    pub fn width(&self) -> u32 {
        self.x_max.saturating_sub(self.x_min)
    }

    pub fn height(&self) -> u32 {
        self.y_max.saturating_sub(self.y_min)
    }
}

/// Detector collaborator seam. The production impl wraps the ONNX session;
/// tests script this trait directly.
pub trait RegionDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectionBox>>;
}

/// YOLO-style field detector backed by an `ort` session.
///
/// The session is loaded once at startup and held read-only for the process
/// lifetime; inference serializes on an internal mutex.
pub struct YoloRegionDetector {
    session: Arc<Mutex<Session>>,
    input_name: String,
    labels: LabelMap,
    input_size: u32,
    confidence_threshold: f32,
    nms_threshold: f32,
}

impl std::fmt::Debug for YoloRegionDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloRegionDetector")
            .field("input_name", &self.input_name)
            .field("input_size", &self.input_size)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("nms_threshold", &self.nms_threshold)
            .finish_non_exhaustive()
    }
}

impl YoloRegionDetector {
    /// Load the detection model from an ONNX file.
    ///
    /// # Errors
    /// Returns an error if the model file is missing, the ONNX runtime fails
    /// to initialize, or the label map size disagrees with `num_classes`.
    pub async fn new<P: AsRef<Path>>(
        model_path: P,
        labels: LabelMap,
        num_classes: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("field detection model not found: {}", model_path.display());
        }

        labels.validate_class_count(num_classes)?;

        info!("Loading field detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load field detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!("Detection model loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            labels,
            input_size: DETECTOR_INPUT_SIZE,
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
        })
    }

    /// Set the confidence threshold for detections.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }
}

impl RegionDetector for YoloRegionDetector {
    fn detect(&self, image: &DynamicImage) -> Result<Vec<DetectionBox>> {
        let tensor = to_detector_tensor(image, self.input_size);
        let info = LetterboxInfo::new(image, self.input_size);

        let mut session = self.session.lock().unwrap();

        let input_value =
            Value::from_array(tensor).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let boxes = parse_predictions(
            output_tensor.view(),
            &info,
            &self.labels,
            self.confidence_threshold,
            self.nms_threshold,
        )?;

        debug!("Detected {} field regions", boxes.len());

        Ok(boxes)
    }
}

/// One raw prediction in source image space, before NMS.
#[derive(Debug, Clone, Copy)]
struct RawBox {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
    class_index: usize,
    confidence: f32,
}

fn iou(a: &RawBox, b: &RawBox) -> f32 {
    let ix = (a.x_max.min(b.x_max) - a.x_min.max(b.x_min)).max(0.0);
    let iy = (a.y_max.min(b.y_max) - a.y_min.max(b.y_min)).max(0.0);
    let intersection = ix * iy;
    let area_a = (a.x_max - a.x_min) * (a.y_max - a.y_min);
    let area_b = (b.x_max - b.x_min) * (b.y_max - b.y_min);
    let union = area_a + area_b - intersection;
    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Decode detector output rows into clipped, integer-coordinate boxes.
///
/// Expects rows of `(cx, cy, w, h, objectness, class scores...)` in letterbox
/// pixel space, shaped `[1, N, 5 + classes]` or `[N, 5 + classes]`. Applies
/// the confidence threshold, per-class NMS, maps back to source coordinates,
/// clips to image bounds and truncates to integers. Rows whose width does not
/// match the label map are a hard error (model/label-table mismatch).
pub(crate) fn parse_predictions(
    output: ArrayViewD<f32>,
    info: &LetterboxInfo,
    labels: &LabelMap,
    confidence_threshold: f32,
    nms_threshold: f32,
) -> Result<Vec<DetectionBox>> {
    let shape = output.shape();

    let (rows, row_len) = match shape.len() {
        3 => (shape[1], shape[2]),
        2 => (shape[0], shape[1]),
        _ => anyhow::bail!("unexpected detector output shape: {:?}", shape),
    };

    let expected_len = 5 + labels.len();
    anyhow::ensure!(
        row_len == expected_len,
        "detector emits rows of {} values but the label map expects {} ({} classes)",
        row_len,
        expected_len,
        labels.len()
    );

    let flat: Vec<f32> = output.iter().copied().collect();

    let mut candidates: Vec<RawBox> = Vec::new();
    for r in 0..rows {
        let row = &flat[r * row_len..(r + 1) * row_len];
        let objectness = row[4];
        if objectness < confidence_threshold {
            continue;
        }

        let (class_index, class_score) = row[5..]
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |(bi, bs), (i, &s)| {
                if s > bs {
                    (i, s)
                } else {
                    (bi, bs)
                }
            });

        let confidence = objectness * class_score;
        if confidence < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let (x_min, y_min) = info.map_to_source(cx - w / 2.0, cy - h / 2.0);
        let (x_max, y_max) = info.map_to_source(cx + w / 2.0, cy + h / 2.0);

        candidates.push(RawBox {
            x_min,
            y_min,
            x_max,
            y_max,
            class_index,
            confidence,
        });
    }

    // Per-class NMS, highest confidence first.
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut kept: Vec<RawBox> = Vec::new();
    for cand in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.class_index == cand.class_index && iou(k, &cand) > nms_threshold);
        if !suppressed {
            kept.push(cand);
        }
    }

    let max_x = info.source_width as f32;
    let max_y = info.source_height as f32;

    let mut boxes: Vec<DetectionBox> = Vec::new();
    for raw in kept {
        let Some(label) = labels.get(raw.class_index) else {
            continue;
        };

        // Clip to image bounds, then truncate (matching the collaborator's
        // float-to-int convention).
        let x_min = raw.x_min.clamp(0.0, max_x) as u32;
        let y_min = raw.y_min.clamp(0.0, max_y) as u32;
        let x_max = raw.x_max.clamp(0.0, max_x) as u32;
        let y_max = raw.y_max.clamp(0.0, max_y) as u32;

        if x_max <= x_min || y_max <= y_min {
            continue;
        }

        boxes.push(DetectionBox {
            x_min,
            y_min,
            x_max,
            y_max,
            label,
            confidence: raw.confidence,
        });
    }

    // Top-to-bottom, left-to-right, matching the printed card layout.
    boxes.sort_by(|a, b| (a.y_min, a.x_min).cmp(&(b.y_min, b.x_min)));

    Ok(boxes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn square_info(size: u32) -> LetterboxInfo {
        LetterboxInfo::new(&DynamicImage::new_rgb8(size, size), size)
    }

    fn row(cx: f32, cy: f32, w: f32, h: f32, obj: f32, scores: [f32; 5]) -> Vec<f32> {
        let mut r = vec![cx, cy, w, h, obj];
        r.extend_from_slice(&scores);
        r
    }

    fn output_from_rows(rows: Vec<Vec<f32>>) -> ndarray::ArrayD<f32> {
        let n = rows.len();
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        Array3::from_shape_vec((1, n, 10), flat).unwrap().into_dyn()
    }

    #[test]
    fn test_label_map_front_order() {
        let map = LabelMap::front();
        assert_eq!(map.get(0), Some(FieldLabel::AadhaarNumber));
        assert_eq!(map.get(1), Some(FieldLabel::DateOfBirth));
        assert_eq!(map.get(2), Some(FieldLabel::Gender));
        assert_eq!(map.get(3), Some(FieldLabel::Name));
        assert_eq!(map.get(4), Some(FieldLabel::Address));
        assert_eq!(map.get(5), None);
    }

    #[test]
    fn test_label_map_class_count_validation() {
        let map = LabelMap::front();
        assert!(map.validate_class_count(5).is_ok());
        assert!(map.validate_class_count(6).is_err());
    }

    fn boxes_ok(
        output: ndarray::ArrayViewD<f32>,
        info: &LetterboxInfo,
    ) -> Vec<DetectionBox> {
        parse_predictions(output, info, &LabelMap::front(), 0.25, 0.45).unwrap()
    }

    #[test]
    fn test_parse_detection_label_and_rect() {
        let info = square_info(416);
        let output = output_from_rows(vec![row(
            100.0,
            50.0,
            40.0,
            20.0,
            0.9,
            [0.0, 0.0, 0.0, 0.95, 0.0],
        )]);

        let boxes = boxes_ok(output.view(), &info);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].label, FieldLabel::Name);
        assert_eq!(
            (boxes[0].x_min, boxes[0].y_min, boxes[0].x_max, boxes[0].y_max),
            (80, 40, 120, 60)
        );
    }

    #[test]
    fn test_parse_filters_low_confidence() {
        let info = square_info(416);
        let output = output_from_rows(vec![row(
            100.0,
            50.0,
            40.0,
            20.0,
            0.1,
            [0.9, 0.0, 0.0, 0.0, 0.0],
        )]);
        assert!(boxes_ok(output.view(), &info).is_empty());
    }

    #[test]
    fn test_parse_clips_to_image_bounds() {
        let info = square_info(416);
        // Box centered near the origin, half of it out of frame.
        let output = output_from_rows(vec![row(
            5.0,
            5.0,
            40.0,
            40.0,
            0.9,
            [0.95, 0.0, 0.0, 0.0, 0.0],
        )]);

        let boxes = boxes_ok(output.view(), &info);
        assert_eq!(boxes.len(), 1);
        assert_eq!((boxes[0].x_min, boxes[0].y_min), (0, 0));
        assert_eq!((boxes[0].x_max, boxes[0].y_max), (25, 25));
    }

    #[test]
    fn test_parse_truncates_float_coordinates() {
        let info = square_info(416);
        let output = output_from_rows(vec![row(
            100.7,
            50.7,
            41.0,
            21.0,
            0.9,
            [0.95, 0.0, 0.0, 0.0, 0.0],
        )]);

        let boxes = boxes_ok(output.view(), &info);
        // 100.7 - 20.5 = 80.2 -> 80; 100.7 + 20.5 = 121.2 -> 121
        assert_eq!((boxes[0].x_min, boxes[0].x_max), (80, 121));
    }

    #[test]
    fn test_parse_nms_suppresses_same_class_overlap() {
        let info = square_info(416);
        let output = output_from_rows(vec![
            row(100.0, 50.0, 40.0, 20.0, 0.9, [0.95, 0.0, 0.0, 0.0, 0.0]),
            row(102.0, 51.0, 40.0, 20.0, 0.8, [0.90, 0.0, 0.0, 0.0, 0.0]),
        ]);

        let boxes = boxes_ok(output.view(), &info);
        assert_eq!(boxes.len(), 1);
        assert!(boxes[0].confidence > 0.8);
    }

    #[test]
    fn test_parse_keeps_overlap_across_classes() {
        let info = square_info(416);
        let output = output_from_rows(vec![
            row(100.0, 50.0, 40.0, 20.0, 0.9, [0.95, 0.0, 0.0, 0.0, 0.0]),
            row(102.0, 51.0, 40.0, 20.0, 0.8, [0.0, 0.90, 0.0, 0.0, 0.0]),
        ]);

        assert_eq!(boxes_ok(output.view(), &info).len(), 2);
    }

    #[test]
    fn test_parse_rejects_class_count_mismatch() {
        let info = square_info(416);
        // Rows of width 8: 5 + 3 classes, not the 5 the map expects.
        let flat = vec![0.0f32; 8];
        let output = Array3::from_shape_vec((1, 1, 8), flat).unwrap().into_dyn();
        assert!(parse_predictions(output.view(), &info, &LabelMap::front(), 0.25, 0.45).is_err());
    }

    #[test]
    fn test_parse_sorts_top_to_bottom() {
        let info = square_info(416);
        let output = output_from_rows(vec![
            row(100.0, 300.0, 40.0, 20.0, 0.9, [0.95, 0.0, 0.0, 0.0, 0.0]),
            row(100.0, 50.0, 40.0, 20.0, 0.9, [0.0, 0.0, 0.0, 0.95, 0.0]),
        ]);

        let boxes = boxes_ok(output.view(), &info);
        assert_eq!(boxes[0].label, FieldLabel::Name);
        assert_eq!(boxes[1].label, FieldLabel::AadhaarNumber);
    }

    #[tokio::test]
    async fn test_model_not_found_error() {
        let result =
            YoloRegionDetector::new("/nonexistent/model.onnx", LabelMap::front(), 5).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_detection_box_dimensions() {
        let b = DetectionBox {
            x_min: 10,
            y_min: 20,
            x_max: 110,
            y_max: 70,
            label: FieldLabel::Address,
            confidence: 0.8,
        };
        assert_eq!(b.width(), 100);
        assert_eq!(b.height(), 50);
    }
}
