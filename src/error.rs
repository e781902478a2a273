use std::path::PathBuf;

use thiserror::Error;

/// The detection model could not be made available.
///
/// Fatal for the session: once the model fails to load, no inference runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelUnavailable {
    #[error("model file {} not found", .path.display())]
    Missing { path: PathBuf },
    #[error("failed to load model {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },
}

/// Failure while analysing one image.
///
/// `ModelUnavailable` ends the session; `Request` only ends the current image.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error(transparent)]
    ModelUnavailable(#[from] ModelUnavailable),
    #[error(transparent)]
    Request(#[from] anyhow::Error),
}

impl AdvisorError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_))
    }
}
