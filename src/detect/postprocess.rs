//! Shared pre/post-processing for YOLO-style detection heads.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::detect::result::{BoundingBox, Detection};

/// Padding colour used when letterboxing.
pub const LETTERBOX_FILL: Rgb<u8> = Rgb([114, 114, 114]);

/// How an image was fitted into the square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Map a box from model-input space back onto the source image.
    pub fn to_source(&self, bbox: BoundingBox, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            x1: (bbox.x1 - self.pad_x) / self.scale,
            y1: (bbox.y1 - self.pad_y) / self.scale,
            x2: (bbox.x2 - self.pad_x) / self.scale,
            y2: (bbox.y2 - self.pad_y) / self.scale,
        }
        .clip(width, height)
    }
}

/// Resize `image` into a `size`x`size` canvas keeping its aspect ratio.
///
/// The image must be non-empty.
pub fn letterbox(image: &RgbImage, size: u32) -> (RgbImage, Letterbox) {
    let (width, height) = image.dimensions();
    let scale = (size as f32 / width as f32).min(size as f32 / height as f32);
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, size);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_width) / 2;
    let pad_y = (size - new_height) / 2;

    let resized = imageops::resize(image, new_width, new_height, FilterType::Triangle);
    let mut canvas = RgbImage::from_pixel(size, size, LETTERBOX_FILL);
    imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    (
        canvas,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    )
}

/// A head output row that survived the score floor, still in model-input space.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Decode a YOLOv8 head of shape `[1, 4 + classes, anchors]` (or the transposed
/// `[1, anchors, 4 + classes]`). The smaller axis is taken as the channel axis.
///
/// Rows whose best class score is not above `floor` are dropped.
pub fn decode_head(data: &[f32], shape: &[usize], floor: f32) -> Result<Vec<Candidate>> {
    let (rows, cols) = match shape {
        [1, rows, cols] | [rows, cols] => (*rows, *cols),
        other => return Err(anyhow!("unexpected detection output shape {:?}", other)),
    };
    let expected = rows
        .checked_mul(cols)
        .ok_or_else(|| anyhow!("detection output dimensions overflow"))?;
    if data.len() != expected {
        return Err(anyhow!(
            "detection output has {} values, shape {:?} needs {}",
            data.len(),
            shape,
            expected
        ));
    }

    let channels_first = rows <= cols;
    let (channels, anchors) = if channels_first {
        (rows, cols)
    } else {
        (cols, rows)
    };
    if channels <= 4 {
        return Err(anyhow!(
            "detection output has {} channels, expected box + class scores",
            channels
        ));
    }
    let value = |channel: usize, anchor: usize| {
        if channels_first {
            data[channel * anchors + anchor]
        } else {
            data[anchor * channels + channel]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, confidence) = (4..channels)
            .map(|channel| (channel - 4, value(channel, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            });
        if !confidence.is_finite() || confidence <= floor {
            continue;
        }
        candidates.push(Candidate {
            class_id,
            confidence,
            bbox: BoundingBox::from_center(
                value(0, anchor),
                value(1, anchor),
                value(2, anchor),
                value(3, anchor),
            ),
        });
    }
    Ok(candidates)
}

/// Class-aware non-maximum suppression. Output is ordered by descending confidence.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for detection in detections {
        let suppressed = kept.iter().any(|other| {
            other.class_id == detection.class_id
                && other.bbox.iou(&detection.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(detection);
        }
    }
    kept
}
