use image::imageops::FilterType;

use crate::domain::error::DomainError;
use crate::domain::ports::feature_extractor::FeatureExtractor;

const GRID: u32 = 16;
const MIN_SIDE: u32 = 8;
/// Pixel variance (on a 0..1 scale) below which an image carries no features.
const MIN_VARIANCE: f64 = 1e-6;

/// Local extractor that embeds a face crop as its normalized grayscale
/// thumbnail. Deterministic and dependency-free at runtime; a stand-in for a
/// learned face model, not a replacement for one.
pub struct ThumbnailExtractor;

impl ThumbnailExtractor {
    pub const DIMENSION: usize = (GRID * GRID) as usize;

    pub fn embed(bytes: &[u8]) -> Result<Vec<f32>, DomainError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| DomainError::Extraction(format!("Undecodable image: {e}")))?;
        let gray = img.to_luma8();
        let (width, height) = gray.dimensions();
        if width < MIN_SIDE || height < MIN_SIDE {
            return Err(DomainError::Extraction(format!(
                "Image too small: {width}x{height} (minimum {MIN_SIDE}x{MIN_SIDE})"
            )));
        }

        let thumb = image::imageops::resize(&gray, GRID, GRID, FilterType::Triangle);
        let pixels: Vec<f64> = thumb.into_raw().into_iter().map(|p| p as f64 / 255.0).collect();

        let n = pixels.len() as f64;
        let mean = pixels.iter().sum::<f64>() / n;
        let variance = pixels.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        if variance < MIN_VARIANCE {
            return Err(DomainError::Extraction(
                "No usable features: image is uniform".to_string(),
            ));
        }

        let norm = (variance * n).sqrt();
        Ok(pixels.iter().map(|p| ((p - mean) / norm) as f32).collect())
    }
}

#[async_trait::async_trait]
impl FeatureExtractor for ThumbnailExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Vec<f32>, DomainError> {
        let bytes = image.to_vec();
        tokio::task::spawn_blocking(move || Self::embed(&bytes))
            .await
            .map_err(|e| DomainError::Extraction(format!("Extractor task failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        Self::DIMENSION
    }

    fn name(&self) -> &str {
        "thumbnail"
    }
}
