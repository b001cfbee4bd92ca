use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::config::OcrConfig;
use crate::error::{QuillError, Result};

/// Prepares raw upload bytes for the recognition engine.
///
/// Rejects images below the minimum dimension, downscales anything above
/// the maximum while keeping aspect ratio, converts to grayscale, and
/// stretches contrast. The result is re-encoded as PNG.
pub fn preprocess_image(bytes: &[u8], config: &OcrConfig) -> Result<Vec<u8>> {
    let reader = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| QuillError::Extraction(format!("Failed to read image: {e}")))?;

    let img = reader
        .decode()
        .map_err(|e| QuillError::Extraction(format!("Failed to decode image: {e}")))?;

    let (width, height) = img.dimensions();
    if width < config.min_image_dimension || height < config.min_image_dimension {
        return Err(QuillError::Extraction(format!(
            "Image too small: {}x{}, minimum {}x{}",
            width, height, config.min_image_dimension, config.min_image_dimension
        )));
    }

    let img = downscale_if_needed(img, config.max_image_dimension);
    let gray = img.to_luma8();
    let gray = stretch_contrast(gray);

    let mut output = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| QuillError::Extraction(format!("Failed to encode image: {e}")))?;

    Ok(output)
}

/// Downscales with Lanczos3 when either dimension exceeds `max_dim`,
/// preserving aspect ratio.
fn downscale_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dim && height <= max_dim {
        return img;
    }

    let ratio = if width > height {
        max_dim as f32 / width as f32
    } else {
        max_dim as f32 / height as f32
    };
    let new_width = (width as f32 * ratio) as u32;
    let new_height = (height as f32 * ratio) as u32;

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

/// Histogram stretch: maps the darkest pixel toward 0 and the lightest
/// toward 255. Flat images are returned unchanged.
fn stretch_contrast(gray: image::GrayImage) -> image::GrayImage {
    let mut min_val = 255u8;
    let mut max_val = 0u8;
    for pixel in gray.pixels() {
        min_val = min_val.min(pixel[0]);
        max_val = max_val.max(pixel[0]);
    }

    if max_val <= min_val {
        return gray;
    }

    let range = (max_val - min_val) as f32;
    image::GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let normalized = (gray.get_pixel(x, y)[0] - min_val) as f32 / range;
        image::Luma([(normalized * 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OcrConfig {
        OcrConfig {
            languages: "eng".to_string(),
            timeout_secs: 60,
            retry_confidence: 70.0,
            fix_confusions: false,
            max_image_dimension: 4096,
            min_image_dimension: 50,
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::new_rgb8(width, height);
        let mut out = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn accepts_valid_image() {
        let result = preprocess_image(&png_bytes(100, 100), &test_config());
        assert!(result.is_ok(), "{:?}", result.err());
        assert!(!result.unwrap().is_empty());
    }

    #[test]
    fn rejects_tiny_image() {
        let err = preprocess_image(&png_bytes(10, 10), &test_config()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("too small"), "{msg}");
        assert!(msg.contains("10x10"), "{msg}");
    }

    #[test]
    fn rejects_when_only_one_dimension_is_small() {
        let config = test_config();
        assert!(preprocess_image(&png_bytes(40, 200), &config).is_err());
        assert!(preprocess_image(&png_bytes(200, 40), &config).is_err());
    }

    #[test]
    fn accepts_image_exactly_at_minimum() {
        assert!(preprocess_image(&png_bytes(50, 50), &test_config()).is_ok());
    }

    #[test]
    fn rejects_invalid_bytes() {
        let garbage = vec![0u8, 1, 2, 3, 4, 5];
        assert!(preprocess_image(&garbage, &test_config()).is_err());
    }

    #[test]
    fn output_is_grayscale_png_with_original_dimensions() {
        let processed = preprocess_image(&png_bytes(100, 200), &test_config()).unwrap();
        let decoded = image::load_from_memory(&processed).unwrap();
        assert_eq!(decoded.dimensions(), (100, 200));
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn downscale_keeps_aspect_ratio() {
        let img = DynamicImage::new_rgb8(2000, 500);
        let resized = downscale_if_needed(img, 1000);
        assert_eq!(resized.dimensions(), (1000, 250));

        let img = DynamicImage::new_rgb8(500, 2000);
        let resized = downscale_if_needed(img, 1000);
        assert_eq!(resized.dimensions(), (250, 1000));
    }

    #[test]
    fn downscale_leaves_small_images_alone() {
        let img = DynamicImage::new_rgb8(500, 500);
        let resized = downscale_if_needed(img, 1000);
        assert_eq!(resized.dimensions(), (500, 500));
    }

    #[test]
    fn stretch_contrast_expands_range() {
        let mut gray = image::GrayImage::new(10, 10);
        for (i, pixel) in gray.pixels_mut().enumerate() {
            pixel[0] = (100 + i % 50) as u8;
        }
        let stretched = stretch_contrast(gray);

        let min = stretched.pixels().map(|p| p[0]).min().unwrap();
        let max = stretched.pixels().map(|p| p[0]).max().unwrap();
        assert_eq!(min, 0);
        assert_eq!(max, 255);
    }

    #[test]
    fn stretch_contrast_leaves_flat_image_unchanged() {
        let gray = image::GrayImage::from_pixel(10, 10, image::Luma([128]));
        let stretched = stretch_contrast(gray);
        assert!(stretched.pixels().all(|p| p[0] == 128));
    }
}
