//! One interactive session: a cached model plus one image at a time.

use image::RgbImage;

use crate::detect::InferenceAdapter;
use crate::error::{AdvisorError, ModelUnavailable};
use crate::ingest::ImageSource;
use crate::report::Card;

/// Result of analysing one image.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub source: String,
    /// The orientation-corrected input image.
    pub image: RgbImage,
    /// One card per detection above the confidence threshold.
    pub cards: Vec<Card>,
}

impl Analysis {
    pub fn found(&self) -> bool {
        !self.cards.is_empty()
    }
}

pub struct Session {
    adapter: InferenceAdapter,
    confidence: f32,
}

impl Session {
    pub fn new(adapter: InferenceAdapter, confidence: f32) -> Self {
        Self {
            adapter,
            confidence,
        }
    }

    /// Load the model now instead of on the first image.
    pub fn ensure_model(&self) -> Result<(), ModelUnavailable> {
        self.adapter.backend().map(|_| ())
    }

    /// Decode, detect and pair every detection above the threshold with its advice.
    ///
    /// The model is checked before the image is read, so a session without a
    /// model never touches its input.
    pub fn analyze(&self, source: &ImageSource) -> Result<Analysis, AdvisorError> {
        self.ensure_model()?;
        let name = source.name();
        let image = source.load()?.to_rgb8();
        let detections = self.adapter.predict(&image, self.confidence)?;
        log::info!(
            "{}: {} detection(s) above {:.2}",
            name,
            detections.len(),
            self.confidence
        );
        Ok(Analysis {
            source: name,
            image,
            cards: detections.into_iter().map(Card::new).collect(),
        })
    }
}
