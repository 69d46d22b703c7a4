use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::application::matcher::find_match;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_store::EmbeddingStore;
use crate::domain::ports::feature_extractor::FeatureExtractor;
use crate::domain::values::distance::validate_embedding;
use crate::domain::values::match_result::MatchResult;
use crate::domain::values::threshold::Threshold;

pub struct VerifyUseCase {
    store: Arc<dyn EmbeddingStore>,
    extractor: Arc<dyn FeatureExtractor>,
    threshold: Threshold,
    timeout: Duration,
}

impl VerifyUseCase {
    pub fn new(
        store: Arc<dyn EmbeddingStore>,
        extractor: Arc<dyn FeatureExtractor>,
        threshold: Threshold,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            extractor,
            threshold,
            timeout,
        }
    }

    /// Extracts the query face and matches it against a fresh snapshot.
    ///
    /// Extraction failures, dimension mismatches and timeouts are errors;
    /// an unknown face is an `Ok` unmatched result.
    pub async fn execute(
        &self,
        image: &[u8],
        threshold: Option<Threshold>,
    ) -> Result<MatchResult, DomainError> {
        let threshold = threshold.unwrap_or(self.threshold);
        tokio::time::timeout(self.timeout, self.run(image, threshold))
            .await
            .map_err(|_| DomainError::Timeout(self.timeout))?
    }

    async fn run(&self, image: &[u8], threshold: Threshold) -> Result<MatchResult, DomainError> {
        let query = self.extractor.extract(image).await?;
        validate_embedding(&query)?;

        let snapshot = self.store.snapshot();
        if let Some(expected) = snapshot.dimension() {
            if query.len() != expected {
                return Err(DomainError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }
        let result = find_match(&query, &snapshot, threshold);
        debug!(
            gallery = snapshot.len(),
            matched = result.matched,
            threshold = threshold.value(),
            "verified query"
        );
        Ok(result)
    }
}
