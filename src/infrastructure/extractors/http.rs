use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::error::DomainError;
use crate::domain::ports::feature_extractor::FeatureExtractor;

/// Extractor backed by an external embedding service. The service receives
/// the raw image as the request body and answers `{"embedding": [...]}`.
pub struct HttpExtractor {
    client: Client,
    url: String,
    dimension: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl HttpExtractor {
    pub fn new(
        url: String,
        dimension: Option<usize>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::InvalidInput(format!("HTTP client error: {e}")))?;
        Ok(Self {
            client,
            url,
            dimension: dimension.unwrap_or(0),
        })
    }
}

#[async_trait::async_trait]
impl FeatureExtractor for HttpExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Vec<f32>, DomainError> {
        let resp = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| DomainError::Extraction(format!("Embedding service error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Extraction(format!(
                "Embedding service {status}: {body}"
            )));
        }

        let result: EmbeddingResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Extraction(format!("Parse error: {e}")))?;
        if result.embedding.is_empty() {
            return Err(DomainError::Extraction(
                "Embedding service returned an empty embedding".to_string(),
            ));
        }
        if self.dimension > 0 && result.embedding.len() != self.dimension {
            return Err(DomainError::DimensionMismatch {
                expected: self.dimension,
                actual: result.embedding.len(),
            });
        }
        Ok(result.embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "http"
    }
}
