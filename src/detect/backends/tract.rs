#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, ObjectClass};

/// Tract-based backend for local ONNX inference.
///
/// Loads a detection model from disk and runs it on RGB frames. The model is
/// expected to emit SSD-style rows `[x1, y1, x2, y2, score, class]` with
/// normalized coordinates and COCO class indices. No network I/O; blocking is
/// bounded by the fixed model size.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    width: u32,
    height: u32,
    confidence_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, width: u32, height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            width,
            height,
            confidence_threshold: 0.5,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;

        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_detections(&self, outputs: TVec<Tensor>) -> Result<Vec<Detection>> {
        let output = outputs
            .get(0)
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let rows = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let values: Vec<f32> = rows.iter().copied().collect();
        if !values.len().is_multiple_of(6) {
            return Err(anyhow!(
                "model output length {} is not a multiple of 6",
                values.len()
            ));
        }

        let mut detections = Vec::new();
        for row in values.chunks_exact(6) {
            let (x1, y1, x2, y2, score, class) =
                (row[0], row[1], row[2], row[3], row[4], row[5]);
            if score < self.confidence_threshold {
                continue;
            }
            let x = x1.clamp(0.0, 1.0);
            let y = y1.clamp(0.0, 1.0);
            detections.push(Detection {
                x,
                y,
                w: (x2.clamp(0.0, 1.0) - x).max(0.0),
                h: (y2.clamp(0.0, 1.0) - y).max(0.0),
                confidence: score,
                class: ObjectClass::from_coco_id(class as usize),
            });
        }
        Ok(detections)
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input))
            .context("ONNX inference failed")?;
        self.extract_detections(outputs)
    }
}
