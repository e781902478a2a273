//! Single-shot camera capture.
//!
//! `CameraSource` grabs one frame from a local V4L2 device (feature:
//! camera-v4l2). Device names starting with `stub://` produce a synthetic
//! frame so the capture path can be exercised without hardware.

use anyhow::{anyhow, Result};
use image::{DynamicImage, Rgb, RgbImage};

/// Configuration for a camera capture.
#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0") or `stub://<name>`.
    pub device: String,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
    /// Frames dropped before the kept one, so auto exposure can settle.
    pub warmup_frames: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
            warmup_frames: 5,
        }
    }
}

impl From<&crate::config::CameraSettings> for CameraConfig {
    fn from(settings: &crate::config::CameraSettings) -> Self {
        Self {
            device: settings.device.clone(),
            width: settings.width,
            height: settings.height,
            ..Self::default()
        }
    }
}

/// Camera capture source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-v4l2")]
    Device(DeviceCamera),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera { config }),
            })
        } else {
            #[cfg(feature = "camera-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::Device(DeviceCamera::new(config)),
                })
            }
            #[cfg(not(feature = "camera-v4l2"))]
            {
                Err(anyhow!(
                    "camera capture from {} requires the camera-v4l2 feature",
                    config.device
                ))
            }
        }
    }

    /// Open the device and negotiate the capture format.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => {
                log::info!("CameraSource: connected to {} (synthetic)", camera.config.device);
                Ok(())
            }
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.connect(),
        }
    }

    /// Capture one frame.
    pub fn capture(&mut self) -> Result<DynamicImage> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => Ok(camera.capture()),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.capture(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
}

impl SyntheticCamera {
    /// A grey frame with a dark disc in the middle, roughly a screw head.
    fn capture(&self) -> DynamicImage {
        let (width, height) = (self.config.width, self.config.height);
        let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
        let radius = width.min(height) as f32 / 4.0;
        let frame = RgbImage::from_fn(width, height, |x, y| {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy <= radius * radius {
                Rgb([60, 60, 60])
            } else {
                Rgb([180, 180, 180])
            }
        });
        DynamicImage::ImageRgb8(frame)
    }
}

// ----------------------------------------------------------------------------
// V4L2 device capture
// ----------------------------------------------------------------------------

#[cfg(feature = "camera-v4l2")]
struct DeviceCamera {
    config: CameraConfig,
    device: Option<v4l::Device>,
    active_width: u32,
    active_height: u32,
    fourcc: [u8; 4],
}

#[cfg(feature = "camera-v4l2")]
impl DeviceCamera {
    fn new(config: CameraConfig) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            device: None,
            fourcc: *b"RGB3",
        }
    }

    fn connect(&mut self) -> Result<()> {
        use anyhow::Context;
        use v4l::video::Capture;

        let device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "CameraSource: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        self.active_width = format.width;
        self.active_height = format.height;
        self.fourcc = format.fourcc.repr;
        self.device = Some(device);

        log::info!(
            "CameraSource: connected to {} ({}x{}, {})",
            self.config.device,
            self.active_width,
            self.active_height,
            String::from_utf8_lossy(&self.fourcc)
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<DynamicImage> {
        use anyhow::Context;
        use v4l::buffer::Type;
        use v4l::io::traits::CaptureStream;

        let device = self.device.as_ref().context("camera not connected")?;
        let mut stream = v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
            .context("create v4l2 buffer stream")?;
        for _ in 0..self.config.warmup_frames {
            stream.next().context("capture v4l2 warm-up frame")?;
        }
        let (buf, meta) = stream.next().context("capture v4l2 frame")?;
        let used = (meta.bytesused as usize).min(buf.len());
        let buf = if used == 0 { buf } else { &buf[..used] };

        match &self.fourcc {
            b"RGB3" => {
                let frame = RgbImage::from_raw(self.active_width, self.active_height, buf.to_vec())
                    .ok_or_else(|| {
                        anyhow!(
                            "RGB frame length {} does not match {}x{}",
                            buf.len(),
                            self.active_width,
                            self.active_height
                        )
                    })?;
                Ok(DynamicImage::ImageRgb8(frame))
            }
            b"MJPG" => super::decode_image(buf),
            other => Err(anyhow!(
                "unsupported camera pixel format {}",
                String::from_utf8_lossy(other)
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config() -> CameraConfig {
        CameraConfig {
            device: "stub://test".to_string(),
            width: 64,
            height: 48,
            warmup_frames: 0,
        }
    }

    #[test]
    fn stub_camera_produces_configured_frame() -> Result<()> {
        let mut source = CameraSource::new(stub_config())?;
        source.connect()?;

        let frame = source.capture()?.to_rgb8();
        assert_eq!(frame.dimensions(), (64, 48));
        assert_eq!(*frame.get_pixel(32, 24), Rgb([60, 60, 60]));
        assert_eq!(*frame.get_pixel(0, 0), Rgb([180, 180, 180]));

        Ok(())
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let config = CameraConfig {
            width: 0,
            ..stub_config()
        };
        assert!(CameraSource::new(config).is_err());
    }

    #[cfg(not(feature = "camera-v4l2"))]
    #[test]
    fn real_devices_need_the_feature() {
        let config = CameraConfig {
            device: "/dev/video0".to_string(),
            ..stub_config()
        };
        assert!(CameraSource::new(config).is_err());
    }
}
