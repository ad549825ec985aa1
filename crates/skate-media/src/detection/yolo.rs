//! Shared YOLOv8 pre- and post-processing.
//!
//! Both detectors take a `[1, C, N]` output tensor where each of the `N`
//! candidates starts with a center-format box `(cx, cy, w, h)` in model
//! input coordinates. Only the single most confident candidate is kept.

use std::sync::Mutex;

use image::{DynamicImage, ImageBuffer, Rgb};
use ndarray::{Array2, ArrayView1};
use ort::session::Session;
use ort::value::{Tensor, Value};

use skate_models::{BoardBox, RgbFrame};

use crate::error::{MediaError, MediaResult};

/// Model input geometry and the scale back to source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputScale {
    pub input_size: u32,
    pub scale_x: f64,
    pub scale_y: f64,
    pub width: u32,
    pub height: u32,
}

impl InputScale {
    pub fn new(input_size: u32, width: u32, height: u32) -> Self {
        let size = input_size.max(1) as f64;
        Self {
            input_size,
            scale_x: width as f64 / size,
            scale_y: height as f64 / size,
            width,
            height,
        }
    }

    /// Map a model-space point to source pixels.
    pub fn point(&self, x: f32, y: f32) -> (f64, f64) {
        (x as f64 * self.scale_x, y as f64 * self.scale_y)
    }

    /// Map a center-format model box to pixel corners, clamped to the frame.
    pub fn corners(&self, cx: f32, cy: f32, w: f32, h: f32) -> BoardBox {
        let (x1, y1) = self.point(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = self.point(cx + w / 2.0, cy + h / 2.0);
        let max_x = self.width as f64;
        let max_y = self.height as f64;
        BoardBox::new(
            x1.clamp(0.0, max_x),
            y1.clamp(0.0, max_y),
            x2.clamp(0.0, max_x),
            y2.clamp(0.0, max_y),
        )
    }
}

/// Raw model output with the batch dimension dropped: `[rows, candidates]`.
#[derive(Debug, Clone)]
pub struct YoloOutput {
    rows: usize,
    candidates: usize,
    data: Vec<f32>,
}

impl YoloOutput {
    /// Wrap a tensor of shape `[1, rows, candidates]` or `[rows, candidates]`.
    pub fn from_raw(shape: &[usize], data: Vec<f32>) -> MediaResult<Self> {
        let (rows, candidates) = match shape {
            [1, rows, candidates] | [rows, candidates] => (*rows, *candidates),
            other => {
                return Err(MediaError::detection_failed(format!(
                    "Unexpected output shape {:?}",
                    other
                )))
            }
        };
        if data.len() != rows * candidates {
            return Err(MediaError::detection_failed(format!(
                "Unexpected output size: expected {}, got {}",
                rows * candidates,
                data.len()
            )));
        }
        Ok(Self {
            rows,
            candidates,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Transpose to `[candidates, rows]`.
    pub fn candidates(&self) -> MediaResult<Array2<f32>> {
        let array = Array2::from_shape_vec((self.rows, self.candidates), self.data.clone())
            .map_err(|e| MediaError::internal(format!("Failed to reshape output: {}", e)))?;
        Ok(array.reversed_axes())
    }
}

/// Index and score of the best candidate at or above `threshold`.
pub fn best_candidate<F>(candidates: &Array2<f32>, threshold: f32, score: F) -> Option<(usize, f32)>
where
    F: Fn(ArrayView1<f32>) -> f32,
{
    candidates
        .outer_iter()
        .enumerate()
        .map(|(i, row)| (i, score(row)))
        .filter(|(_, s)| s.is_finite() && *s >= threshold)
        .fold(None, |best: Option<(usize, f32)>, (i, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
}

/// Convert a decoded frame to an image.
pub fn frame_to_image(frame: &RgbFrame) -> MediaResult<DynamicImage> {
    if !frame.is_well_formed() {
        return Err(MediaError::internal(format!(
            "Invalid image data length: expected {}, got {}",
            RgbFrame::byte_len(frame.width, frame.height),
            frame.data.len()
        )));
    }

    let buffer: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| MediaError::internal("Failed to create image buffer"))?;

    Ok(DynamicImage::ImageRgb8(buffer))
}

/// Resize to the square model input, normalize to [0, 1], lay out as NCHW.
pub fn preprocess(img: &DynamicImage, input_size: u32) -> MediaResult<Value> {
    let resized = img.resize_exact(input_size, input_size, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();
    let (w, h) = (input_size as usize, input_size as usize);

    let mut chw_data: Vec<f32> = Vec::with_capacity(3 * h * w);
    for c in 0..3 {
        for y in 0..h {
            for x in 0..w {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                chw_data.push(pixel[c] as f32 / 255.0);
            }
        }
    }

    let shape = vec![1usize, 3, h, w];
    Tensor::from_array((shape, chw_data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| MediaError::internal(format!("Failed to create tensor: {}", e)))
}

/// Run one inference and copy out `output0`.
pub fn run_inference(session: &Mutex<Session>, input: Value) -> MediaResult<YoloOutput> {
    let mut session = session
        .lock()
        .map_err(|_| MediaError::internal("Session lock poisoned"))?;

    let outputs = session
        .run(ort::inputs![input])
        .map_err(|e| MediaError::detection_failed(format!("ONNX inference failed: {}", e)))?;

    let output = outputs
        .get("output0")
        .ok_or_else(|| MediaError::detection_failed("Missing output0 tensor"))?;

    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| MediaError::detection_failed(format!("Failed to extract tensor: {}", e)))?;

    let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
    YoloOutput::from_raw(&dims, data.to_vec())
}
