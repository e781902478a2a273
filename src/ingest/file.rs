//! Uploaded image decoding.
//!
//! Phones store portrait shots as landscape pixels plus an EXIF orientation
//! tag. Decoding applies that tag so detection boxes line up with what the
//! user sees.

use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

/// Decode JPEG or PNG bytes and apply the EXIF orientation, if any.
///
/// An unreadable orientation tag leaves the image as decoded.
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("failed to inspect image data")?;
    match reader.format() {
        Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
        Some(other) => return Err(anyhow!("unsupported image format {:?}", other)),
        None => return Err(anyhow!("unrecognized image data")),
    }

    let mut decoder = reader.into_decoder().context("failed to open image decoder")?;
    let orientation = decoder.orientation().unwrap_or_else(|err| {
        log::debug!("ignoring unreadable EXIF orientation: {}", err);
        Orientation::NoTransforms
    });
    let mut image = DynamicImage::from_decoder(decoder).context("failed to decode image")?;
    image.apply_orientation(orientation);
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encode(image: &RgbImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image.clone())
            .write_to(&mut out, format)
            .unwrap();
        out.into_inner()
    }

    /// Insert an APP1 segment carrying only an orientation tag right after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(b"Exif\0\0");
        payload.extend_from_slice(b"MM\x00\x2a\x00\x00\x00\x08");
        payload.extend_from_slice(&[0x00, 0x01]);
        payload.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        payload.extend_from_slice(&orientation.to_be_bytes());
        payload.extend_from_slice(&[0x00, 0x00]);
        payload.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let segment_len = (payload.len() + 2) as u16;
        let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&[0xff, 0xe1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn decodes_png_without_changes() {
        let source = RgbImage::from_pixel(6, 3, Rgb([200, 10, 10]));
        let decoded = decode_image(&encode(&source, ImageFormat::Png)).unwrap();
        assert_eq!(decoded.to_rgb8(), source);
    }

    #[test]
    fn applies_exif_rotation_to_jpeg() {
        let source = RgbImage::from_pixel(16, 8, Rgb([90, 90, 90]));
        let plain = encode(&source, ImageFormat::Jpeg);
        assert_eq!(decode_image(&plain).unwrap().to_rgb8().dimensions(), (16, 8));

        let rotated = with_exif_orientation(&plain, 6);
        assert_eq!(decode_image(&rotated).unwrap().to_rgb8().dimensions(), (8, 16));
    }

    #[test]
    fn rejects_garbage_and_unsupported_formats() {
        assert!(decode_image(b"not an image at all").is_err());
        assert!(decode_image(b"GIF89a\x01\x00\x01\x00").is_err());
        assert!(decode_image(&[]).is_err());
    }
}
