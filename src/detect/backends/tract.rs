#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::postprocess::{decode_head, letterbox, non_max_suppression};
use crate::detect::result::Detection;

/// Tract-based backend for ONNX exports of YOLO detectors.
///
/// The model is loaded from a local file and only read afterwards.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    input_size: u32,
    labels: Vec<String>,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for `input_size`x`input_size` inputs.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_size: u32,
        labels: Vec<String>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, f32::fact([1, 3, side, side]).into())
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            labels,
            iou_threshold: 0.7,
        })
    }

    /// Override the default NMS overlap threshold.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    fn label_for(&self, class_id: usize) -> String {
        self.labels
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{class_id}"))
    }

    fn build_input(&self, canvas: &RgbImage) -> Tensor {
        let side = self.input_size as usize;
        tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
            canvas.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
        })
        .into_tensor()
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn predict(&self, image: &RgbImage, floor: f32) -> Result<Vec<Detection>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(anyhow!("cannot run detection on an empty image"));
        }

        let (canvas, fit) = letterbox(image, self.input_size);
        let input = self.build_input(&canvas);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let data: Vec<f32> = scores.iter().copied().collect();
        let candidates = decode_head(&data, scores.shape(), floor)?;

        let detections = candidates
            .into_iter()
            .map(|candidate| Detection {
                label: self.label_for(candidate.class_id),
                class_id: candidate.class_id,
                confidence: candidate.confidence,
                bbox: fit.to_source(candidate.bbox, width, height),
            })
            .collect();
        Ok(non_max_suppression(detections, self.iou_threshold))
    }
}
