//! Image normalization: everything stored becomes a JPEG.
//!
//! Transparent PNGs are flattened onto white first; WEBP and any other
//! decodable format go through the same JPEG re-encode so the gallery
//! serves one consistent format and compression level.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};

use stockbook_core::MIN_STORED_EDGE;

use crate::error::ImageError;

pub const JPEG_QUALITY: u8 = 90;

/// A normalized JPEG plus the source pixel dimensions.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = f32::from(px[3]) / 255.0;
        let blend =
            |c: u8| f32::from(c).mul_add(alpha, 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    rgb
}

/// Decodes `bytes`, rejects icon-sized images, flattens alpha onto white,
/// and re-encodes as JPEG.
///
/// # Errors
///
/// - [`ImageError::Decode`] if the bytes are not a decodable image.
/// - [`ImageError::TooSmall`] if both edges are under the stored minimum.
/// - [`ImageError::EmptyOutput`] if encoding yields an empty buffer.
pub fn normalize_to_jpeg(bytes: &[u8]) -> Result<NormalizedImage, ImageError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());
    if width < MIN_STORED_EDGE && height < MIN_STORED_EDGE {
        return Err(ImageError::TooSmall { width, height });
    }

    let rgb = if img.color().has_alpha() {
        flatten_onto_white(&img)
    } else {
        img.to_rgb8()
    };

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode_image(&rgb)?;
    if out.is_empty() {
        return Err(ImageError::EmptyOutput);
    }

    Ok(NormalizedImage {
        bytes: out,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png_with_alpha(width: u32, height: u32, alpha: u8) -> Vec<u8> {
        let mut rgba = RgbaImage::new(width, height);
        for px in rgba.pixels_mut() {
            *px = Rgba([255, 0, 0, alpha]);
        }
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("test PNG should encode");
        out
    }

    #[test]
    fn transparent_png_flattens_onto_white_jpeg() {
        let png = png_with_alpha(80, 80, 0);
        let normalized = normalize_to_jpeg(&png).expect("should normalize");
        assert_eq!(
            image::guess_format(&normalized.bytes).expect("output should be an image"),
            ImageFormat::Jpeg
        );

        let decoded = image::load_from_memory(&normalized.bytes)
            .expect("output should decode")
            .to_rgb8();
        let px = decoded.get_pixel(40, 40);
        // Fully transparent red flattens to (near-)white.
        assert!(px[0] >= 248 && px[1] >= 248 && px[2] >= 248, "got {px:?}");
    }

    #[test]
    fn opaque_png_keeps_its_colour() {
        let png = png_with_alpha(80, 80, 255);
        let normalized = normalize_to_jpeg(&png).expect("should normalize");
        let decoded = image::load_from_memory(&normalized.bytes)
            .expect("output should decode")
            .to_rgb8();
        let px = decoded.get_pixel(40, 40);
        assert!(px[0] >= 240 && px[1] <= 20 && px[2] <= 20, "got {px:?}");
    }

    #[test]
    fn icon_sized_image_is_rejected() {
        let png = png_with_alpha(30, 30, 255);
        let result = normalize_to_jpeg(&png);
        assert!(matches!(
            result,
            Err(ImageError::TooSmall {
                width: 30,
                height: 30
            })
        ));
    }

    #[test]
    fn one_large_edge_is_enough() {
        let png = png_with_alpha(30, 400, 255);
        assert!(normalize_to_jpeg(&png).is_ok());
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let result = normalize_to_jpeg(b"definitely not an image");
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }
}
