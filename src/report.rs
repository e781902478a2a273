//! Result presentation: terminal cards, an HTML page and a JSON summary.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbImage;
use serde::Serialize;

use crate::advice::{advice_for, AdviceEntry};
use crate::annotate::annotate;
use crate::detect::Detection;
use crate::error::ModelUnavailable;

pub const APP_TITLE: &str = "Vida Asistanı";
pub const APP_TAGLINE: &str = "Vida başlığını taratın ve doğru ucu anında öğrenin.";
pub const NOTHING_FOUND: &str =
    "Görüntüde tanımlı bir vida başı tespit edilemedi veya güven oranı düşük.";
pub const ANNOTATED_CAPTION: &str = "Tespit Edilen Vidalar";

/// One detection paired with the advice shown for it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Card {
    pub detection: Detection,
    pub advice: &'static AdviceEntry,
}

impl Card {
    pub fn new(detection: Detection) -> Self {
        let advice = advice_for(&detection.label);
        Self { detection, advice }
    }
}

/// Message shown when the model cannot be used.
pub fn model_unavailable_message(err: &ModelUnavailable) -> String {
    match err {
        ModelUnavailable::Missing { path } => format!(
            "Model dosyası ({}) bulunamadı! Lütfen modeli bu konuma yerleştirin.",
            path.display()
        ),
        ModelUnavailable::Load { reason, .. } => format!("Model yüklenemedi: {reason}"),
    }
}

/// Message shown when a single image could not be analysed.
pub fn failure_message(err: &dyn std::fmt::Display) -> String {
    format!("Bir hata oluştu: {err}")
}

/// Plain text cards, or the nothing-found notice.
pub fn render_terminal(cards: &[Card]) -> String {
    if cards.is_empty() {
        return format!("⚠️  {NOTHING_FOUND}\n");
    }
    let mut out = String::new();
    for card in cards {
        let advice = card.advice;
        let _ = writeln!(
            out,
            "━━ {} ({:.0}%) [{}]",
            advice.title,
            card.detection.confidence * 100.0,
            advice.color
        );
        let _ = writeln!(out, "🔧 Önerilen Uç: {}", advice.recommendation);
        if advice.has_warning() {
            let _ = writeln!(out, "⚠️  Uyarı: {}", advice.warning);
        }
    }
    out
}

/// Self-contained HTML page with the annotated image and one card per detection.
pub fn render_html(cards: &[Card], annotated_image: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(src) = annotated_image {
        let _ = write!(
            body,
            r#"<figure><img src="{}" alt="{caption}"><figcaption>{caption}</figcaption></figure>"#,
            escape_html(src),
            caption = ANNOTATED_CAPTION
        );
    }
    if cards.is_empty() {
        let _ = write!(body, r#"<div class="notice">⚠️ {}</div>"#, NOTHING_FOUND);
    }
    for card in cards {
        body.push_str(&render_card_html(card.advice));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="tr">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
  body {{ font-family: sans-serif; max-width: 720px; margin: 0 auto; padding: 16px; }}
  figure {{ margin: 0; }}
  figure img {{ width: 100%; border-radius: 12px; }}
  figcaption {{ color: #777; text-align: center; font-size: 14px; }}
  .notice {{ background-color: #fff3cd; color: #856404; padding: 16px; border-radius: 12px; margin-top: 20px; }}
</style>
</head>
<body>
<h1>🛠️ {title}</h1>
<p>{tagline}</p>
{body}
</body>
</html>
"#,
        title = APP_TITLE,
        tagline = APP_TAGLINE,
        body = body
    )
}

fn render_card_html(advice: &AdviceEntry) -> String {
    let warning = if advice.has_warning() {
        format!(
            r#"<div style="background-color: rgba(0,0,0,0.2); padding: 10px; border-radius: 8px; margin-top: 15px;"><strong>⚠️ Uyarı:</strong> {}</div>"#,
            escape_html(advice.warning)
        )
    } else {
        String::new()
    };
    format!(
        r#"
<div style="background-color: {color}; padding: 20px; border-radius: 15px; color: white; margin-top: 20px; box-shadow: 0 4px 15px rgba(0,0,0,0.2);">
  <h2 style="margin:0; font-size:24px; border-bottom: 2px solid rgba(255,255,255,0.3); padding-bottom: 10px; margin-bottom: 10px;">{title}</h2>
  <p style="font-size:18px; font-weight:bold; margin-bottom: 5px;">🔧 Önerilen Uç:</p>
  <p style="font-size:20px; margin-top:0;">{recommendation}</p>
  {warning}
</div>
"#,
        color = escape_html(advice.color),
        title = escape_html(advice.title),
        recommendation = escape_html(advice.recommendation),
        warning = warning
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Machine readable result for one image.
#[derive(Debug, Serialize)]
pub struct Summary<'a> {
    pub source: &'a str,
    pub found: bool,
    pub cards: &'a [Card],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_report: Option<&'a Path>,
}

/// Files written for one analysed image.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportPaths {
    pub annotated_image: PathBuf,
    pub html_report: PathBuf,
}

/// Output stems handed out during one run.
///
/// Two inputs with the same name (`front/shot.jpg`, `back/shot.png`) get
/// `shot` and `shot_2`, so a later image never overwrites an earlier one.
#[derive(Debug, Default)]
pub struct OutputNames {
    used: HashSet<String>,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file-safe stem for `name` not handed out before in this run.
    pub fn claim(&mut self, name: &str) -> String {
        let base = safe_stem(name);
        let mut stem = base.clone();
        let mut n = 1;
        while !self.used.insert(stem.clone()) {
            n += 1;
            stem = format!("{base}_{n}");
        }
        stem
    }
}

/// Reduce an image name to a single path component.
fn safe_stem(name: &str) -> String {
    let last = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_control() || c == ':' { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.trim().is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Write `<stem>_annotated.png` and `<stem>_report.html` into `out_dir`.
///
/// `stem` is reduced to its last path component so the files always land in `out_dir`.
pub fn write_outputs(
    out_dir: &Path,
    stem: &str,
    image: &RgbImage,
    cards: &[Card],
) -> Result<ReportPaths> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;
    let stem = safe_stem(stem);

    let image_name = format!("{stem}_annotated.png");
    let annotated_image = out_dir.join(&image_name);
    annotate(image, cards)
        .save(&annotated_image)
        .with_context(|| format!("failed to write {}", annotated_image.display()))?;

    let html_report = out_dir.join(format!("{stem}_report.html"));
    std::fs::write(&html_report, render_html(cards, Some(&image_name)))
        .with_context(|| format!("failed to write {}", html_report.display()))?;

    Ok(ReportPaths {
        annotated_image,
        html_report,
    })
}
