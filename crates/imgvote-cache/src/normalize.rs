//! Per-request image normalization

use image::error::ImageFormatHint;
use image::{DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader, ImageResult};
use std::io::Cursor;
use tracing::debug;

/// Decode, apply EXIF orientation, convert to 8-bit RGB and re-encode.
///
/// The output format is the detected one, or the one implied by `ext` when
/// detection fails. Any failure returns the input unchanged.
pub fn normalize(raw: &[u8], ext: &str) -> Vec<u8> {
    match try_normalize(raw, ext) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(ext, error = %e, "Normalization skipped, serving raw bytes");
            raw.to_vec()
        }
    }
}

fn try_normalize(raw: &[u8], ext: &str) -> ImageResult<Vec<u8>> {
    let mut reader = ImageReader::new(Cursor::new(raw)).with_guessed_format()?;
    if reader.format().is_none() {
        if let Some(format) = ImageFormat::from_extension(ext.trim_start_matches('.')) {
            reader.set_format(format);
        }
    }
    let format = reader.format().ok_or_else(|| {
        ImageError::Unsupported(ImageFormatHint::Name(ext.to_string()).into())
    })?;

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut img = DynamicImage::from_decoder(decoder)?;
    img.apply_orientation(orientation);

    let img = match img {
        DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), format)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_garbage_returned_unchanged() {
        let raw = b"definitely not an image".to_vec();
        assert_eq!(normalize(&raw, ".jpg"), raw);
    }

    #[test]
    fn test_empty_returned_unchanged() {
        assert!(normalize(&[], ".png").is_empty());
    }

    #[test]
    fn test_rgba_converted_to_rgb() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 128]));
        let raw = png_bytes(DynamicImage::ImageRgba8(img));

        let out = normalize(&raw, ".png");
        let decoded = image::load_from_memory_with_format(&out, ImageFormat::Png).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageRgb8(_)));
        assert_eq!(decoded.width(), 3);
        assert_eq!(decoded.height(), 2);
    }

    #[test]
    fn test_rgb_pixels_preserved() {
        let img = RgbImage::from_pixel(4, 4, Rgb([200, 100, 50]));
        let raw = png_bytes(DynamicImage::ImageRgb8(img));

        let out = normalize(&raw, ".png");
        let decoded = image::load_from_memory(&out).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(2, 2), &Rgb([200, 100, 50]));
    }

    #[test]
    fn test_deterministic() {
        let img = RgbaImage::from_pixel(5, 5, Rgba([1, 2, 3, 255]));
        let raw = png_bytes(DynamicImage::ImageRgba8(img));

        assert_eq!(normalize(&raw, ".png"), normalize(&raw, ".png"));
    }
}
