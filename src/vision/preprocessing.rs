// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing: the bold-text OCR filter and detector tensor prep

use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::filter::filter3x3;
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;
use ndarray::Array4;

/// Sharpening kernel applied as the last preprocessing step.
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Enhance bold or faint text before OCR.
///
/// Deterministic, never branches on image content, always succeeds:
/// 1. single-channel grayscale
/// 2. morphological opening with a 1x1 rectangular element (kept as-is;
///    changing the kernel would alter OCR results on edge-case inputs)
/// 3. contrast blend `2*x - 0.5*x`, saturating at the pixel range
/// 4. global binarization at Otsu's threshold
/// 5. sharpen with a fixed 3x3 Laplacian-style kernel
///
/// The output is single-channel with the input's dimensions.
pub fn preprocess_for_bold_text(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();

    // 1x1 structuring element: radius 0 under the L-inf norm.
    let opened = open(&gray, Norm::LInf, 0);

    let contrast = GrayImage::from_fn(opened.width(), opened.height(), |x, y| {
        let v = opened.get_pixel(x, y)[0] as f32 * 1.5;
        Luma([v.min(255.0) as u8])
    });

    let level = otsu_level(&contrast);
    let binary = threshold(&contrast, level, ThresholdType::Binary);

    filter3x3::<Luma<u8>, f32, u8>(&binary, &SHARPEN_KERNEL)
}

/// Scale and offsets applied while letterboxing an image for the detector.
/// Used to map detection coordinates back to source image space.
#[derive(Debug, Clone, Copy)]
pub struct LetterboxInfo {
    /// Scale factor applied
    pub scale: f32,
    /// X offset from padding
    pub offset_x: u32,
    /// Y offset from padding
    pub offset_y: u32,
    /// Source image width
    pub source_width: u32,
    /// Source image height
    pub source_height: u32,
}

impl LetterboxInfo {
    pub fn new(image: &DynamicImage, target_size: u32) -> Self {
        let (src_w, src_h) = image.dimensions();

        if src_w == 0 || src_h == 0 {
            return Self {
                scale: 1.0,
                offset_x: 0,
                offset_y: 0,
                source_width: src_w,
                source_height: src_h,
            };
        }

        let scale = (target_size as f32 / src_w as f32).min(target_size as f32 / src_h as f32);
        let new_w = (src_w as f32 * scale).round() as u32;
        let new_h = (src_h as f32 * scale).round() as u32;

        Self {
            scale,
            offset_x: (target_size - new_w) / 2,
            offset_y: (target_size - new_h) / 2,
            source_width: src_w,
            source_height: src_h,
        }
    }

    /// Map a coordinate from letterbox space back to source image space.
    pub fn map_to_source(&self, x: f32, y: f32) -> (f32, f32) {
        let src_x = (x - self.offset_x as f32) / self.scale;
        let src_y = (y - self.offset_y as f32) / self.scale;
        (src_x, src_y)
    }
}

/// Resize with aspect-ratio preservation, padded to a gray square.
pub fn letterbox(image: &DynamicImage, target_size: u32) -> DynamicImage {
    let (src_w, src_h) = image.dimensions();

    if src_w == 0 || src_h == 0 {
        return DynamicImage::ImageRgb8(RgbImage::from_pixel(
            target_size,
            target_size,
            Rgb([128, 128, 128]),
        ));
    }

    let scale = (target_size as f32 / src_w as f32).min(target_size as f32 / src_h as f32);
    let new_w = ((src_w as f32 * scale).round() as u32).max(1);
    let new_h = ((src_h as f32 * scale).round() as u32).max(1);

    let resized = image.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3);
    let rgb = resized.to_rgb8();

    let mut output = RgbImage::from_pixel(target_size, target_size, Rgb([128, 128, 128]));
    let offset_x = (target_size - new_w) / 2;
    let offset_y = (target_size - new_h) / 2;

    for y in 0..new_h {
        for x in 0..new_w {
            output.put_pixel(x + offset_x, y + offset_y, *rgb.get_pixel(x, y));
        }
    }

    DynamicImage::ImageRgb8(output)
}

/// Convert an image to the detector's input tensor.
///
/// Letterboxes to `target_size`, then fills an NCHW `[1, 3, S, S]` tensor
/// with `pixel / 255` values (YOLO-style normalization, no mean/std).
pub fn to_detector_tensor(image: &DynamicImage, target_size: u32) -> Array4<f32> {
    let boxed = letterbox(image, target_size);
    let rgb = boxed.to_rgb8();

    let size = target_size as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for y in 0..size {
        for x in 0..size {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = pixel[c] as f32 / 255.0;
            }
        }
    }

    tensor
}
