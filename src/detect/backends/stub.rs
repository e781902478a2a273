use anyhow::{anyhow, Result};
use image::RgbImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// Backend that returns a fixed set of detections for every image.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    detections: Vec<Detection>,
    fail_with: Option<String>,
}

impl StubBackend {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            fail_with: None,
        }
    }

    /// A backend whose every prediction fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            detections: Vec::new(),
            fail_with: Some(message.into()),
        }
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn predict(&self, _image: &RgbImage, _floor: f32) -> Result<Vec<Detection>> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{}", message));
        }
        Ok(self.detections.clone())
    }
}
