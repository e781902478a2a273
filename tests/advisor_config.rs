use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::Builder;

use bit_advisor::config::AdvisorConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "BIT_ADVISOR_CONFIG",
        "BIT_ADVISOR_MODEL",
        "BIT_ADVISOR_CONFIDENCE",
        "BIT_ADVISOR_IOU",
        "BIT_ADVISOR_LABELS",
        "BIT_ADVISOR_OUT_DIR",
        "BIT_ADVISOR_CAMERA",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = AdvisorConfig::load().expect("load config");
    assert_eq!(cfg, AdvisorConfig::default());
    cfg.validate().expect("defaults are valid");
}

#[test]
fn loads_json_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".json").tempfile().expect("temp config");
    let json = r#"{
        "confidence": 0.6,
        "out_dir": "scans",
        "model": {
            "path": "models/heads.onnx",
            "input_size": 416,
            "iou_threshold": 0.5,
            "labels": ["PH", "PZ", "T"]
        },
        "camera": {
            "device": "/dev/video2",
            "width": 1280,
            "height": 720
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("BIT_ADVISOR_CONFIG", file.path());
    std::env::set_var("BIT_ADVISOR_CONFIDENCE", "0.3");
    std::env::set_var("BIT_ADVISOR_LABELS", "H, SL");

    let cfg = AdvisorConfig::load().expect("load config");

    assert_eq!(cfg.model.path, PathBuf::from("models/heads.onnx"));
    assert_eq!(cfg.model.input_size, 416);
    assert_eq!(cfg.model.iou_threshold, 0.5);
    assert_eq!(cfg.model.labels, vec!["H", "SL"]);
    assert_eq!(cfg.confidence, 0.3);
    assert_eq!(cfg.out_dir, PathBuf::from("scans"));
    assert_eq!(cfg.camera.device, "/dev/video2");
    assert_eq!(cfg.camera.width, 1280);
    assert_eq!(cfg.camera.height, 720);
    cfg.validate().expect("valid config");

    clear_env();
}

#[test]
fn loads_toml_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = Builder::new().suffix(".toml").tempfile().expect("temp config");
    let toml = r#"
confidence = 0.5

[model]
path = "best.onnx"
labels = ["T", "PH"]
"#;
    std::io::Write::write_all(&mut file, toml.as_bytes()).expect("write config");
    std::env::set_var("BIT_ADVISOR_CONFIG", file.path());

    let cfg = AdvisorConfig::load().expect("load config");
    assert_eq!(cfg.confidence, 0.5);
    assert_eq!(cfg.model.labels, vec!["T", "PH"]);
    assert_eq!(cfg.model.input_size, 640);

    clear_env();
}

#[test]
fn malformed_env_values_are_errors() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("BIT_ADVISOR_CONFIDENCE", "high");
    assert!(AdvisorConfig::load().is_err());
    clear_env();

    std::env::set_var("BIT_ADVISOR_CONFIG", "/nonexistent/bit-advisor.json");
    assert!(AdvisorConfig::load().is_err());
    clear_env();
}
