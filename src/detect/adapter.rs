use std::cell::{Cell, OnceCell};

use anyhow::Context;
use image::RgbImage;

use crate::config::ModelSettings;
use crate::detect::backend::DetectorBackend;
use crate::detect::result::{filter_by_confidence, Detection};
use crate::error::{AdvisorError, ModelUnavailable};

type LoadedBackend = Result<Box<dyn DetectorBackend>, ModelUnavailable>;
type Loader = Box<dyn FnOnce() -> LoadedBackend>;

/// Lazily loaded detection model.
///
/// The loader runs at most once. Its outcome, backend or error, is kept for
/// the lifetime of the adapter, so a failed load is never retried.
pub struct InferenceAdapter {
    loader: Cell<Option<Loader>>,
    backend: OnceCell<LoadedBackend>,
}

impl InferenceAdapter {
    pub fn new<F>(loader: F) -> Self
    where
        F: FnOnce() -> LoadedBackend + 'static,
    {
        Self {
            loader: Cell::new(Some(Box::new(loader))),
            backend: OnceCell::new(),
        }
    }

    /// Adapter around an already constructed backend.
    pub fn with_backend<B: DetectorBackend + 'static>(backend: B) -> Self {
        Self::new(move || Ok(Box::new(backend) as Box<dyn DetectorBackend>))
    }

    /// Adapter that loads the ONNX model described by `settings` on first use.
    pub fn from_settings(settings: &ModelSettings) -> Self {
        let settings = settings.clone();
        Self::new(move || load_model(&settings))
    }

    /// The loaded backend, loading it on first call.
    pub fn backend(&self) -> Result<&dyn DetectorBackend, ModelUnavailable> {
        let loaded = self.backend.get_or_init(|| match self.loader.take() {
            Some(loader) => loader(),
            None => Err(ModelUnavailable::Load {
                path: Default::default(),
                reason: "model loader already consumed".to_string(),
            }),
        });
        loaded.as_deref().map_err(Clone::clone)
    }

    /// Run detection and keep detections strictly above `threshold`.
    pub fn predict(
        &self,
        image: &RgbImage,
        threshold: f32,
    ) -> Result<Vec<Detection>, AdvisorError> {
        let backend = self.backend()?;
        let detections = backend
            .predict(image, threshold)
            .with_context(|| format!("{} backend failed", backend.name()))?;
        Ok(filter_by_confidence(detections, threshold))
    }
}

fn load_model(settings: &ModelSettings) -> LoadedBackend {
    if !settings.path.exists() {
        return Err(ModelUnavailable::Missing {
            path: settings.path.clone(),
        });
    }

    #[cfg(feature = "backend-tract")]
    {
        let backend = crate::detect::backends::TractBackend::new(
            &settings.path,
            settings.input_size,
            settings.labels.clone(),
        )
        .map_err(|err| ModelUnavailable::Load {
            path: settings.path.clone(),
            reason: format!("{err:#}"),
        })?
        .with_iou_threshold(settings.iou_threshold);
        log::info!(
            "model loaded from {} ({}x{} input, {} labels)",
            settings.path.display(),
            settings.input_size,
            settings.input_size,
            settings.labels.len()
        );
        Ok(Box::new(backend))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(ModelUnavailable::Load {
            path: settings.path.clone(),
            reason: "model loading requires the backend-tract feature".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::detect::backends::StubBackend;
    use crate::detect::result::BoundingBox;

    fn detection(label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            class_id: 0,
            confidence,
            bbox: BoundingBox::new(1.0, 1.0, 4.0, 4.0),
        }
    }

    #[test]
    fn loader_runs_once_and_failure_is_cached() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let adapter = InferenceAdapter::new(move || {
            counter.set(counter.get() + 1);
            Err(ModelUnavailable::Missing {
                path: "best.onnx".into(),
            })
        });
        let image = RgbImage::new(4, 4);

        for _ in 0..3 {
            let err = adapter.predict(&image, 0.45).unwrap_err();
            assert!(err.is_fatal());
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn predict_applies_threshold_after_backend() {
        let adapter = InferenceAdapter::with_backend(StubBackend::new(vec![
            detection("PH", 0.9),
            detection("PZ", 0.45),
            detection("T", 0.1),
        ]));
        let kept = adapter.predict(&RgbImage::new(4, 4), 0.45).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "PH");
    }

    #[test]
    fn backend_failure_is_not_fatal() {
        let adapter = InferenceAdapter::with_backend(StubBackend::failing("tensor shape mismatch"));
        let err = adapter.predict(&RgbImage::new(4, 4), 0.45).unwrap_err();
        assert!(!err.is_fatal());
        assert!(format!("{err:#}").contains("tensor shape mismatch"));
        assert!(adapter.backend().is_ok());
    }

    #[test]
    fn missing_artifact_is_reported_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ModelSettings {
            path: dir.path().join("best.onnx"),
            ..ModelSettings::default()
        };
        let adapter = InferenceAdapter::from_settings(&settings);
        let err = adapter.backend().err().unwrap();
        assert_eq!(
            err,
            ModelUnavailable::Missing {
                path: settings.path.clone()
            }
        );
    }

    #[cfg(feature = "backend-tract")]
    #[test]
    fn unreadable_artifact_is_a_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.onnx");
        std::fs::write(&path, b"definitely not protobuf").unwrap();
        let settings = ModelSettings {
            path: path.clone(),
            ..ModelSettings::default()
        };
        let adapter = InferenceAdapter::from_settings(&settings);
        match adapter.backend() {
            Err(ModelUnavailable::Load { path: reported, .. }) => assert_eq!(reported, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("garbage model should not load"),
        }
    }
}
