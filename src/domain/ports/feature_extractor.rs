use crate::domain::error::DomainError;

/// Maps raw image bytes to a fixed-length face embedding.
///
/// Implementations must be deterministic for identical input and must return
/// [`DomainError::Extraction`] for corrupt images or images without usable
/// features, never a degenerate vector.
#[async_trait::async_trait]
pub trait FeatureExtractor: Send + Sync {
    async fn extract(&self, image: &[u8]) -> Result<Vec<f32>, DomainError>;

    /// Embedding length this extractor always produces, or 0 when it is only
    /// known after the first extraction.
    fn dimension(&self) -> usize;

    /// Extractor name for logging
    fn name(&self) -> &str;
}
