//! Vida Asistanı: screw-head detection with driver bit recommendations.
//!
//! An image of a fastener head goes through a pretrained detection model and
//! every detected head class is mapped to the bit that fits it.
//!
//! # Module Structure
//!
//! - `ingest`: image sources (files, uploads, camera) with EXIF orientation applied
//! - `detect`: lazily loaded detection model and YOLO post-processing
//! - `advice`: static label to recommendation table
//! - `report` / `annotate`: cards, HTML page, annotated image
//! - `session`: ties the above together for one image at a time
//!
//! A model that cannot be loaded ends the session. Any other failure only
//! affects the image being analysed.

pub mod advice;
pub mod annotate;
pub mod config;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod report;
pub mod session;
pub mod ui;

pub use advice::{advice_for, AdviceEntry};
pub use config::{AdvisorConfig, CameraSettings, ModelSettings};
pub use detect::{
    filter_by_confidence, BoundingBox, Detection, DetectorBackend, InferenceAdapter, StubBackend,
};
pub use error::{AdvisorError, ModelUnavailable};
pub use ingest::{CameraConfig, ImageSource};
pub use report::Card;
pub use session::{Analysis, Session};
