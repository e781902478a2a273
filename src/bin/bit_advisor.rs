//! bit-advisor - scan a screw head and get the right driver bit
//!
//! This tool:
//! 1. Loads the detection model once (a missing model ends the run)
//! 2. Reads images from files, a camera, or stdin paths, one at a time
//! 3. Prints one advice card per detected screw head
//! 4. Writes an annotated image and an HTML report per image

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use bit_advisor::config::split_csv;
use bit_advisor::report::{self, OutputNames, Summary};
use bit_advisor::ui::{Ui, UiMode};
use bit_advisor::{
    AdvisorConfig, AdvisorError, CameraConfig, ImageSource, InferenceAdapter, Session,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// ONNX model exported from the trained detector.
    #[arg(long, global = true)]
    model: Option<PathBuf>,
    /// Minimum confidence (exclusive) for a detection to be reported.
    #[arg(long, global = true)]
    confidence: Option<f32>,
    /// Overlap threshold for non-maximum suppression.
    #[arg(long, global = true)]
    iou: Option<f32>,
    /// Square model input size in pixels.
    #[arg(long, global = true)]
    input_size: Option<u32>,
    /// Class names in class id order, comma separated.
    #[arg(long, global = true)]
    labels: Option<String>,
    /// Directory for annotated images and HTML reports.
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    /// Print a JSON summary per image instead of text cards.
    #[arg(long, global = true)]
    json: bool,
    /// Progress display.
    #[arg(long, global = true, value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse image files (JPEG or PNG).
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Capture one frame from a camera and analyse it.
    Camera {
        /// V4L2 device path, or stub://<name> for a synthetic frame.
        #[arg(long)]
        device: Option<String>,
    },
    /// Read image paths from stdin, one per line, until EOF or `q`.
    Interactive,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut cfg = AdvisorConfig::load()?;
    apply_cli(&cli, &mut cfg);
    cfg.validate()?;

    let ui = Ui::new(cli.ui, std::io::stderr().is_terminal());
    let session = Session::new(InferenceAdapter::from_settings(&cfg.model), cfg.confidence);

    {
        let stage = ui.stage("Model yükleniyor");
        if let Err(err) = session.ensure_model() {
            stage.fail();
            log::error!("{}", err);
            eprintln!("{}", report::model_unavailable_message(&err));
            return Ok(ExitCode::FAILURE);
        }
    }

    let mut names = OutputNames::new();
    let mut failures = 0usize;
    match &cli.command {
        Command::Scan { images } => {
            for path in images {
                let source = ImageSource::File(path.clone());
                if !process(&session, &ui, &cfg, &mut names, cli.json, &source) {
                    failures += 1;
                }
            }
        }
        Command::Camera { device } => {
            let mut camera = CameraConfig::from(&cfg.camera);
            if let Some(device) = device {
                camera.device = device.clone();
            }
            let source = ImageSource::Camera(camera);
            if !process(&session, &ui, &cfg, &mut names, cli.json, &source) {
                failures += 1;
            }
        }
        Command::Interactive => {
            eprintln!("🛠️  {} - {}", report::APP_TITLE, report::APP_TAGLINE);
            eprintln!("Resim yolunu girin (çıkmak için q):");
            let mut stdin = std::io::stdin().lock();
            let mut buf = Vec::new();
            while let Some(entry) = next_entry(&mut stdin, &mut buf)? {
                if entry.is_empty() {
                    continue;
                }
                if entry == "q" || entry == "quit" {
                    break;
                }
                let source = ImageSource::File(entry.into());
                if !process(&session, &ui, &cfg, &mut names, cli.json, &source) {
                    failures += 1;
                }
            }
        }
    }

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Next trimmed line from `reader`, or `None` at EOF.
///
/// Lines that are not valid UTF-8 are decoded lossily so the entry fails on
/// its own instead of ending the session.
fn next_entry<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).trim().to_string()))
}

fn apply_cli(cli: &Cli, cfg: &mut AdvisorConfig) {
    if let Some(model) = &cli.model {
        cfg.model.path = model.clone();
    }
    if let Some(confidence) = cli.confidence {
        cfg.confidence = confidence;
    }
    if let Some(iou) = cli.iou {
        cfg.model.iou_threshold = iou;
    }
    if let Some(size) = cli.input_size {
        cfg.model.input_size = size;
    }
    if let Some(labels) = &cli.labels {
        let parsed = split_csv(labels);
        if !parsed.is_empty() {
            cfg.model.labels = parsed;
        }
    }
    if let Some(out) = &cli.out {
        cfg.out_dir = out.clone();
    }
}

/// Analyse one image and show the result. Returns false when the image failed.
fn process(
    session: &Session,
    ui: &Ui,
    cfg: &AdvisorConfig,
    names: &mut OutputNames,
    json: bool,
    source: &ImageSource,
) -> bool {
    let stage = ui.stage("Analiz ediliyor");
    let analysis = match session.analyze(source) {
        Ok(analysis) => analysis,
        Err(err) => {
            stage.fail();
            report_failure(&err);
            return false;
        }
    };

    let stem = names.claim(&analysis.source);
    let written = report::write_outputs(&cfg.out_dir, &stem, &analysis.image, &analysis.cards);
    let paths = match written {
        Ok(paths) => paths,
        Err(err) => {
            stage.fail();
            report_failure(&AdvisorError::Request(err));
            return false;
        }
    };
    drop(stage);

    if json {
        let summary = Summary {
            source: &analysis.source,
            found: analysis.found(),
            cards: &analysis.cards,
            annotated_image: Some(paths.annotated_image.as_path()),
            html_report: Some(paths.html_report.as_path()),
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                report_failure(&AdvisorError::Request(err.into()));
                return false;
            }
        }
    } else {
        println!("{}: {}", report::ANNOTATED_CAPTION, paths.annotated_image.display());
        print!("{}", report::render_terminal(&analysis.cards));
        println!("Rapor: {}", paths.html_report.display());
    }
    true
}

fn report_failure(err: &AdvisorError) {
    match err {
        AdvisorError::ModelUnavailable(err) => {
            log::error!("{}", err);
            eprintln!("{}", report::model_unavailable_message(err));
        }
        AdvisorError::Request(err) => {
            log::warn!("request failed: {:#}", err);
            eprintln!("{}", report::failure_message(&format!("{err:#}")));
        }
    }
}
