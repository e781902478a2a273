use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL_PATH: &str = "best.onnx";
const DEFAULT_CONFIDENCE: f32 = 0.45;
const DEFAULT_IOU: f32 = 0.7;
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_LABELS: [&str; 6] = ["H", "PH", "PZ", "Reference", "SL", "T"];
const DEFAULT_OUT_DIR: &str = "advisor_out";
const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;

#[derive(Debug, Deserialize, Default)]
struct AdvisorConfigFile {
    confidence: Option<f32>,
    out_dir: Option<PathBuf>,
    model: Option<ModelConfigFile>,
    camera: Option<CameraConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    input_size: Option<u32>,
    iou_threshold: Option<f32>,
    labels: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorConfig {
    pub model: ModelSettings,
    /// Detections must score strictly above this to be reported.
    pub confidence: f32,
    pub out_dir: PathBuf,
    pub camera: CameraSettings,
}

/// Where the detection model lives and how to feed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub path: PathBuf,
    /// Square model input side in pixels.
    pub input_size: u32,
    pub iou_threshold: f32,
    /// Class names ordered by class id.
    pub labels: Vec<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            input_size: DEFAULT_INPUT_SIZE,
            iou_threshold: DEFAULT_IOU,
            labels: DEFAULT_LABELS.iter().map(|label| label.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_CAMERA_DEVICE.to_string(),
            width: DEFAULT_CAMERA_WIDTH,
            height: DEFAULT_CAMERA_HEIGHT,
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            confidence: DEFAULT_CONFIDENCE,
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            camera: CameraSettings::default(),
        }
    }
}

impl AdvisorConfig {
    /// Defaults, then the file named by `BIT_ADVISOR_CONFIG`, then environment overrides.
    ///
    /// Callers apply command line overrides on top and call [`AdvisorConfig::validate`].
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("BIT_ADVISOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        Ok(cfg)
    }

    fn from_file(file: AdvisorConfigFile) -> Self {
        let defaults = Self::default();
        let model = file.model.unwrap_or_default();
        let camera = file.camera.unwrap_or_default();
        Self {
            model: ModelSettings {
                path: model.path.unwrap_or(defaults.model.path),
                input_size: model.input_size.unwrap_or(defaults.model.input_size),
                iou_threshold: model.iou_threshold.unwrap_or(defaults.model.iou_threshold),
                labels: model.labels.unwrap_or(defaults.model.labels),
            },
            confidence: file.confidence.unwrap_or(defaults.confidence),
            out_dir: file.out_dir.unwrap_or(defaults.out_dir),
            camera: CameraSettings {
                device: camera.device.unwrap_or(defaults.camera.device),
                width: camera.width.unwrap_or(defaults.camera.width),
                height: camera.height.unwrap_or(defaults.camera.height),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("BIT_ADVISOR_MODEL") {
            if !path.trim().is_empty() {
                self.model.path = PathBuf::from(path);
            }
        }
        if let Ok(value) = std::env::var("BIT_ADVISOR_CONFIDENCE") {
            self.confidence = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("BIT_ADVISOR_CONFIDENCE must be a number between 0 and 1"))?;
        }
        if let Ok(value) = std::env::var("BIT_ADVISOR_IOU") {
            self.model.iou_threshold = value
                .trim()
                .parse()
                .map_err(|_| anyhow!("BIT_ADVISOR_IOU must be a number between 0 and 1"))?;
        }
        if let Ok(labels) = std::env::var("BIT_ADVISOR_LABELS") {
            let parsed = split_csv(&labels);
            if !parsed.is_empty() {
                self.model.labels = parsed;
            }
        }
        if let Ok(dir) = std::env::var("BIT_ADVISOR_OUT_DIR") {
            if !dir.trim().is_empty() {
                self.out_dir = PathBuf::from(dir);
            }
        }
        if let Ok(device) = std::env::var("BIT_ADVISOR_CAMERA") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_interval("confidence", self.confidence)?;
        check_unit_interval("iou threshold", self.model.iou_threshold)?;
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            return Err(anyhow!(
                "model input size must be a positive multiple of 32, got {}",
                self.model.input_size
            ));
        }
        if self.model.labels.is_empty() {
            return Err(anyhow!("at least one class label must be configured"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        Ok(())
    }
}

/// Split a comma separated list, dropping blanks.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

fn check_unit_interval(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(anyhow!("{} must be within [0, 1], got {}", name, value));
    }
    Ok(())
}

fn read_config_file(path: &Path) -> Result<AdvisorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg: AdvisorConfigFile = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_predictor_settings() {
        let cfg = AdvisorConfig::default();
        assert_eq!(cfg.confidence, 0.45);
        assert_eq!(cfg.model.iou_threshold, 0.7);
        assert_eq!(cfg.model.input_size, 640);
        assert_eq!(cfg.model.path, PathBuf::from("best.onnx"));
        assert_eq!(cfg.model.labels, vec!["H", "PH", "PZ", "Reference", "SL", "T"]);
        cfg.validate().unwrap();
    }

    #[test]
    fn validation_rejects_out_of_range_values() {
        let mut cfg = AdvisorConfig::default();
        cfg.confidence = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = AdvisorConfig::default();
        cfg.model.input_size = 100;
        assert!(cfg.validate().is_err());

        let mut cfg = AdvisorConfig::default();
        cfg.model.labels.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = AdvisorConfig::default();
        cfg.model.iou_threshold = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn csv_split_drops_blanks() {
        assert_eq!(split_csv(" PH, ,PZ,"), vec!["PH", "PZ"]);
        assert!(split_csv(" , ").is_empty());
    }
}
