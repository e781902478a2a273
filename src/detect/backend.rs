use anyhow::Result;
use image::RgbImage;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// A backend is built once per session and only read afterwards, so `predict`
/// takes `&self`.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on an oriented RGB image.
    ///
    /// `floor` is a score hint: backends may drop candidates at or below it
    /// early. Callers still apply the confidence threshold themselves.
    fn predict(&self, image: &RgbImage, floor: f32) -> Result<Vec<Detection>>;
}
