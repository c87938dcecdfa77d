// src/services/image_processor.rs
use crate::errors::FigyError;
use base64::{Engine as _, engine::general_purpose};
use image::GenericImageView;

const MAX_DIMENSION: u32 = 4096;
const RESIZE_ABOVE: u32 = 2048;

/// Prepares uploaded image bytes for the analysis client: validates the
/// format and dimensions, downscales oversized uploads and re-encodes
/// the result as a PNG data URL (the payload shape the vision endpoint
/// expects).
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn prepare(&self, data: &[u8]) -> Result<String, FigyError> {
        let img = image::load_from_memory(data)
            .map_err(|e| FigyError::ImageProcessing(format!("Invalid image format: {}", e)))?;

        let (width, height) = img.dimensions();
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(FigyError::ImageProcessing(format!(
                "Image dimensions exceed {}x{}",
                MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        let img = if width > RESIZE_ABOVE || height > RESIZE_ABOVE {
            img.resize(RESIZE_ABOVE, RESIZE_ABOVE, image::imageops::FilterType::Lanczos3)
        } else {
            img
        };

        let mut encoded = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut encoded),
            image::ImageFormat::Png,
        )
        .map_err(|e| FigyError::ImageProcessing(format!("Failed to encode image: {}", e)))?;

        Ok(format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&encoded)
        ))
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn prepare_emits_png_data_url() {
        let processor = ImageProcessor::new();
        let url = processor.prepare(&png_bytes(4, 4)).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        let encoded = url.trim_start_matches("data:image/png;base64,");
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        let img = image::load_from_memory(&decoded).unwrap();
        assert_eq!(img.dimensions(), (4, 4));
    }

    #[test]
    fn prepare_rejects_garbage_bytes() {
        let processor = ImageProcessor::new();
        let err = processor.prepare(b"definitely not an image").unwrap_err();
        assert!(matches!(err, FigyError::ImageProcessing(_)));
    }

    #[test]
    fn prepare_rejects_oversized_dimensions() {
        let processor = ImageProcessor::new();
        let err = processor.prepare(&png_bytes(4097, 2)).unwrap_err();
        assert!(matches!(err, FigyError::ImageProcessing(_)));
    }

    #[test]
    fn prepare_downscales_large_uploads() {
        let processor = ImageProcessor::new();
        let url = processor.prepare(&png_bytes(3000, 1500)).unwrap();

        let encoded = url.trim_start_matches("data:image/png;base64,");
        let decoded = general_purpose::STANDARD.decode(encoded).unwrap();
        let img = image::load_from_memory(&decoded).unwrap();
        let (width, height) = img.dimensions();
        assert!(width <= 2048 && height <= 2048);
        // Aspect ratio preserved by the resize.
        assert_eq!(width, 2048);
        assert_eq!(height, 1024);
    }
}
