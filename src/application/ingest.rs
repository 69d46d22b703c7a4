use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::entities::embedding_record::EmbeddingRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_store::EmbeddingStore;
use crate::domain::ports::feature_extractor::FeatureExtractor;
use crate::domain::values::identity::Identity;
use crate::infrastructure::fs::gallery_dir::GalleryDir;

/// A gallery image that could not be ingested.
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of scanning the whole gallery directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub loaded: usize,
    pub failures: Vec<IngestFailure>,
}

/// Turns gallery image files into store records.
pub struct IngestUseCase {
    store: Arc<dyn EmbeddingStore>,
    extractor: Arc<dyn FeatureExtractor>,
    gallery: GalleryDir,
}

impl IngestUseCase {
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

    pub fn gallery(&self) -> &GalleryDir {
        &self.gallery
    }

    /// Scans every image in the gallery directory into the store.
    ///
    /// An unreadable directory is an error; a bad image is logged, recorded
    /// in the report and skipped.
    pub async fn bulk_load(&self) -> Result<IngestReport, DomainError> {
        self.gallery.check_available()?;
        let images = self.gallery.list_images()?;
        let mut report = IngestReport::default();

        for path in images {
            match self.ingest_file(&path).await {
                Ok(_) => report.loaded += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping gallery image");
                    report.failures.push(IngestFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            loaded = report.loaded,
            failed = report.failures.len(),
            dir = %self.gallery.root().display(),
            "gallery loaded"
        );
        Ok(report)
    }

    /// Extracts one gallery image and upserts it under its file stem.
    ///
    /// The record only becomes visible once extraction has succeeded; no
    /// store lock is held while the extractor runs.
    pub async fn ingest_file(&self, path: &Path) -> Result<Identity, DomainError> {
        let identity = Identity::from_image_path(path).ok_or_else(|| {
            DomainError::InvalidInput(format!("Not a gallery image: {}", path.display()))
        })?;
        let bytes = tokio::fs::read(path).await?;
        let vector = self.extractor.extract(&bytes).await?;
        self.store.insert_or_replace(EmbeddingRecord::new(
            identity.clone(),
            vector,
            Some(path.to_path_buf()),
        ))?;
        debug!(identity = %identity, path = %path.display(), "ingested gallery image");
        Ok(identity)
    }

    /// Drops records whose backing gallery file no longer exists.
    pub fn prune_missing(&self) -> Vec<Identity> {
        let snapshot = self.store.snapshot();
        let mut pruned = Vec::new();
        for record in snapshot.iter() {
            let Some(source) = record.source.as_deref() else {
                continue;
            };
            if !source.exists() && self.store.remove_from_source(record.identity.as_str(), source) {
                pruned.push(record.identity.clone());
            }
        }
        pruned
    }

    /// Drops the record backed by a deleted gallery file. Records that were
    /// since re-extracted from another file are left alone.
    pub fn forget_file(&self, path: &Path) -> Option<Identity> {
        let identity = Identity::from_image_path(path)?;
        self.store
            .remove_from_source(identity.as_str(), path)
            .then_some(identity)
    }
}
