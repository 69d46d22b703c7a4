use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::domain::entities::embedding_record::RecordSummary;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_store::EmbeddingStore;
use crate::domain::values::identity::Identity;
use crate::infrastructure::fs::gallery_dir::GalleryDir;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Forgotten {
    pub identity: Identity,
    pub removed_record: bool,
    pub deleted_files: Vec<PathBuf>,
}

pub struct GalleryUseCase {
    store: Arc<dyn EmbeddingStore>,
    gallery: GalleryDir,
}

impl GalleryUseCase {
    pub fn new(store: Arc<dyn EmbeddingStore>, gallery: GalleryDir) -> Self {
        Self { store, gallery }
    }

    pub fn list(&self) -> Vec<RecordSummary> {
        self.store.snapshot().iter().map(RecordSummary::from).collect()
    }

    /// Deletes the identity's gallery files and its record.
    pub async fn forget(&self, identity: &str) -> Result<Forgotten, DomainError> {
        let identity = Identity::new(identity).map_err(DomainError::InvalidInput)?;
        let deleted_files = self.gallery.remove_images(&identity).await?;
        let removed_record = self.store.remove(identity.as_str());
        if !removed_record && deleted_files.is_empty() {
            return Err(DomainError::NotFound(format!("Unknown identity: {identity}")));
        }
        info!(identity = %identity, files = deleted_files.len(), "forgot identity");
        Ok(Forgotten {
            identity,
            removed_record,
            deleted_files,
        })
    }
}
