use serde::Serialize;

/// Axis-aligned box in pixel coordinates of the oriented input image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from a center point and size, as detection heads emit them.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union. Zero when either box is empty.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = BoundingBox {
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
            x2: self.x2.min(other.x2),
            y2: self.y2.min(other.y2),
        }
        .area();
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Clamp the box to an image of the given size.
    pub fn clip(self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

/// One located object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub label: String,
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Keep only detections whose confidence is strictly above `threshold`.
pub fn filter_by_confidence(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|detection| detection.confidence > threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            class_id: 0,
            confidence,
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
        }
    }

    #[test]
    fn filter_is_strictly_greater_than_threshold() {
        let input = vec![
            detection("PH", 0.9),
            detection("PZ", 0.45),
            detection("T", 0.44),
            detection("H", 0.451),
            detection("SL", 0.0),
        ];
        let kept = filter_by_confidence(input, 0.45);
        let labels: Vec<_> = kept.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["PH", "H"]);
        assert!(kept.iter().all(|d| d.confidence > 0.45));
    }

    #[test]
    fn filter_of_nothing_is_nothing() {
        assert!(filter_by_confidence(Vec::new(), 0.45).is_empty());
        assert!(filter_by_confidence(vec![detection("PH", 0.2)], 0.45).is_empty());
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        let c = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&b), 0.0);
        assert!((a.iou(&c) - 50.0 / 150.0).abs() < 1e-6);
        assert_eq!(BoundingBox::default().iou(&BoundingBox::default()), 0.0);
    }

    #[test]
    fn center_form_and_clipping() {
        let bbox = BoundingBox::from_center(5.0, 5.0, 20.0, 4.0).clip(8, 8);
        assert_eq!(bbox, BoundingBox::new(0.0, 3.0, 8.0, 7.0));
    }
}
