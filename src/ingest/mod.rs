//! Image sources.
//!
//! Every source yields a decoded, orientation-corrected image held in memory:
//! - image files or in-memory uploads (JPEG/PNG)
//! - a single frame from a local V4L2 camera (feature: camera-v4l2)
//! - a synthetic camera frame for `stub://` devices (testing)
//!
//! Sources never write captured images to disk.

pub mod camera;
pub mod file;

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;

pub use camera::{CameraConfig, CameraSource};
pub use file::decode_image;

/// Where the next image comes from.
#[derive(Clone, Debug)]
pub enum ImageSource {
    File(PathBuf),
    Bytes { name: String, data: Vec<u8> },
    Camera(CameraConfig),
}

impl ImageSource {
    /// Short name used for logging and output file stems.
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string()),
            Self::Bytes { name, .. } => name.clone(),
            Self::Camera(_) => "camera".to_string(),
        }
    }

    /// Read and decode the image.
    pub fn load(&self) -> Result<DynamicImage> {
        match self {
            Self::File(path) => {
                let data = std::fs::read(path)
                    .with_context(|| format!("failed to read image {}", path.display()))?;
                decode_image(&data).with_context(|| format!("failed to decode {}", path.display()))
            }
            Self::Bytes { name, data } => {
                decode_image(data).with_context(|| format!("failed to decode {}", name))
            }
            Self::Camera(config) => {
                let mut source = CameraSource::new(config.clone())?;
                source.connect()?;
                source.capture()
            }
        }
    }
}
