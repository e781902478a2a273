use image::{Rgb, RgbImage};

use crate::detect::BoundingBox;
use crate::report::Card;

/// Outline width in pixels.
pub const BOX_THICKNESS: u32 = 3;

/// Copy of `image` with each card's box outlined in its advice colour.
pub fn annotate(image: &RgbImage, cards: &[Card]) -> RgbImage {
    let mut canvas = image.clone();
    for card in cards {
        draw_box(&mut canvas, &card.detection.bbox, Rgb(card.advice.rgb()));
    }
    canvas
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let bbox = bbox.clip(width, height);
    let x1 = (bbox.x1.floor() as u32).min(width - 1);
    let y1 = (bbox.y1.floor() as u32).min(height - 1);
    let x2 = (bbox.x2.ceil() as u32).saturating_sub(1).clamp(x1, width - 1);
    let y2 = (bbox.y2.ceil() as u32).saturating_sub(1).clamp(y1, height - 1);

    for t in 0..BOX_THICKNESS {
        let top = (y1 + t).min(y2);
        let bottom = y2.saturating_sub(t).max(y1);
        let left = (x1 + t).min(x2);
        let right = x2.saturating_sub(t).max(x1);
        for x in x1..=x2 {
            canvas.put_pixel(x, top, color);
            canvas.put_pixel(x, bottom, color);
        }
        for y in y1..=y2 {
            canvas.put_pixel(left, y, color);
            canvas.put_pixel(right, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::advice_for;
    use crate::detect::Detection;

    fn card(label: &str, bbox: BoundingBox) -> Card {
        Card {
            detection: Detection {
                label: label.to_string(),
                class_id: 0,
                confidence: 0.9,
                bbox,
            },
            advice: advice_for(label),
        }
    }

    #[test]
    fn outlines_box_in_advice_colour() {
        let image = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let out = annotate(&image, &[card("PH", BoundingBox::new(10.0, 10.0, 30.0, 30.0))]);
        let purple = Rgb([0x9b, 0x59, 0xb6]);
        assert_eq!(*out.get_pixel(10, 10), purple);
        assert_eq!(*out.get_pixel(20, 12), purple);
        assert_eq!(*out.get_pixel(29, 20), purple);
        assert_eq!(*out.get_pixel(20, 20), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(5, 5), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(10, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_outside_the_image_are_clipped() {
        let image = RgbImage::new(8, 8);
        let out = annotate(
            &image,
            &[
                card("T", BoundingBox::new(-5.0, -5.0, 50.0, 50.0)),
                card("H", BoundingBox::new(7.5, 7.5, 7.5, 7.5)),
            ],
        );
        assert_eq!(*out.get_pixel(0, 0), Rgb([0x34, 0x98, 0xdb]));
        assert_eq!(out.dimensions(), (8, 8));
    }
}
