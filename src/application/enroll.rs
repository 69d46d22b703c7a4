use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::entities::embedding_record::EmbeddingRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_store::EmbeddingStore;
use crate::domain::ports::feature_extractor::FeatureExtractor;
use crate::domain::values::distance::validate_embedding;
use crate::domain::values::identity::Identity;
use crate::domain::values::image_kind::ImageKind;
use crate::infrastructure::fs::gallery_dir::GalleryDir;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Enrollment {
    pub identity: Identity,
    pub path: PathBuf,
    pub dimension: usize,
}

/// Manual enrollment: saves the image into the gallery directory and makes
/// the identity matchable before returning.
pub struct EnrollUseCase {
    store: Arc<dyn EmbeddingStore>,
    extractor: Arc<dyn FeatureExtractor>,
    gallery: GalleryDir,
}

impl EnrollUseCase {
    pub fn new(
        store: Arc<dyn EmbeddingStore>,
        extractor: Arc<dyn FeatureExtractor>,
        gallery: GalleryDir,
    ) -> Self {
        Self {
            store,
            extractor,
            gallery,
        }
    }

    pub async fn execute(&self, identity: &str, image: &[u8]) -> Result<Enrollment, DomainError> {
        let identity = Identity::new(identity).map_err(DomainError::InvalidInput)?;
        if image.is_empty() {
            return Err(DomainError::InvalidInput("Empty image".to_string()));
        }

        // Reject bad images before they reach the gallery directory.
        let vector = self.extractor.extract(image).await?;
        validate_embedding(&vector)?;
        if let Some(expected) = self.store.dimension() {
            if vector.len() != expected {
                return Err(DomainError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        // Insert before the file becomes visible; a rejected image never
        // reaches the gallery.
        let kind = ImageKind::sniff(image).unwrap_or(ImageKind::Jpg);
        let staged = self.gallery.stage_image(&identity, kind, image).await?;
        let target = staged.target().to_path_buf();
        let previous = self.store.snapshot().get(identity.as_str()).cloned();
        let dimension = vector.len();
        let record = EmbeddingRecord::new(identity.clone(), vector, Some(target.clone()));
        if let Err(e) = self.store.insert_or_replace(record) {
            self.gallery.discard(staged).await;
            return Err(e);
        }

        let path = match self.gallery.commit(staged).await {
            Ok(path) => path,
            Err(e) => {
                self.restore(&identity, previous, &target);
                return Err(e);
            }
        };

        info!(identity = %identity, path = %path.display(), "enrolled face");
        Ok(Enrollment {
            identity,
            path,
            dimension,
        })
    }

    /// Puts back whatever the store held for `identity` before a failed
    /// enrollment.
    fn restore(&self, identity: &Identity, previous: Option<EmbeddingRecord>, target: &Path) {
        match previous {
            Some(record) => {
                if let Err(e) = self.store.insert_or_replace(record) {
                    warn!(identity = %identity, error = %e, "failed to restore previous record");
                }
            }
            None => {
                self.store.remove_from_source(identity.as_str(), target);
            }
        }
    }
}
