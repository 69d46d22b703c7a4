pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::enroll::{EnrollUseCase, Enrollment};
use crate::application::gallery::{Forgotten, GalleryUseCase};
use crate::application::ingest::{IngestReport, IngestUseCase};
use crate::application::verify::VerifyUseCase;
use crate::config::{ExtractorKind, Settings};
use crate::domain::entities::embedding_record::RecordSummary;
use crate::domain::entities::snapshot::GallerySnapshot;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_store::EmbeddingStore;
use crate::domain::ports::feature_extractor::FeatureExtractor;
use crate::domain::values::match_result::MatchResult;
use crate::domain::values::threshold::Threshold;
use crate::infrastructure::extractors::http::HttpExtractor;
use crate::infrastructure::extractors::thumbnail::ThumbnailExtractor;
use crate::infrastructure::fs::gallery_dir::GalleryDir;
use crate::infrastructure::memory::embedding_store::InMemoryEmbeddingStore;
use crate::infrastructure::watcher::{DirectoryWatcher, WatcherConfig};
use std::sync::Arc;

/// Face gallery: an in-memory embedding store fed from a directory of
/// known-identity images, queried by `verify`.
pub struct FaceMatch {
    store: Arc<dyn EmbeddingStore>,
    extractor: Arc<dyn FeatureExtractor>,
    settle_delay: std::time::Duration,
    ingest_uc: Arc<IngestUseCase>,
    verify_uc: VerifyUseCase,
    enroll_uc: EnrollUseCase,
    gallery_uc: GalleryUseCase,
}

impl FaceMatch {
    pub fn new(settings: Settings) -> Result<Self, DomainError> {
        let extractor: Arc<dyn FeatureExtractor> = match settings.extractor {
            ExtractorKind::Thumbnail => Arc::new(ThumbnailExtractor),
            ExtractorKind::Http => {
                let url = settings.extractor_url.clone().ok_or_else(|| {
                    DomainError::InvalidInput(
                        "FACEMATCH_EXTRACTOR_URL is required for the http extractor".to_string(),
                    )
                })?;
                Arc::new(HttpExtractor::new(
                    url,
                    settings.extractor_dimension,
                    settings.query_timeout,
                )?)
            }
        };
        Self::with_extractor(settings, extractor)
    }

    pub fn with_extractor(
        settings: Settings,
        extractor: Arc<dyn FeatureExtractor>,
    ) -> Result<Self, DomainError> {
        let store: Arc<dyn EmbeddingStore> = match extractor.dimension() {
            0 => Arc::new(InMemoryEmbeddingStore::new()),
            d => Arc::new(InMemoryEmbeddingStore::with_dimension(d)),
        };

        // Canonical root so watcher event paths compare equal to record sources.
        let root = std::fs::canonicalize(&settings.gallery_dir)
            .unwrap_or_else(|_| settings.gallery_dir.clone());
        let gallery = GalleryDir::new(root);

        Ok(Self {
            ingest_uc: Arc::new(IngestUseCase::new(
                store.clone(),
                extractor.clone(),
                gallery.clone(),
            )),
            verify_uc: VerifyUseCase::new(
                store.clone(),
                extractor.clone(),
                settings.threshold,
                settings.query_timeout,
            ),
            enroll_uc: EnrollUseCase::new(store.clone(), extractor.clone(), gallery.clone()),
            gallery_uc: GalleryUseCase::new(store.clone(), gallery),
            settle_delay: settings.settle_delay,
            store,
            extractor,
        })
    }

    /// Startup scan of the gallery directory. An unreadable directory is
    /// fatal; individual bad images are reported and skipped.
    pub async fn load(&self) -> Result<IngestReport, DomainError> {
        tracing::info!(extractor = self.extractor.name(), "loading gallery");
        self.ingest_uc.bulk_load().await
    }

    /// Starts background ingestion of images appearing in the gallery.
    pub fn watch(&self) -> Result<DirectoryWatcher, DomainError> {
        self.watch_with(WatcherConfig {
            settle_delay: self.settle_delay,
            ..WatcherConfig::default()
        })
    }

    pub fn watch_with(&self, config: WatcherConfig) -> Result<DirectoryWatcher, DomainError> {
        DirectoryWatcher::start(self.ingest_uc.clone(), config)
    }

    pub async fn verify(&self, image: &[u8]) -> Result<MatchResult, DomainError> {
        self.verify_uc.execute(image, None).await
    }

    pub async fn verify_with_threshold(
        &self,
        image: &[u8],
        threshold: Threshold,
    ) -> Result<MatchResult, DomainError> {
        self.verify_uc.execute(image, Some(threshold)).await
    }

    pub async fn enroll(&self, identity: &str, image: &[u8]) -> Result<Enrollment, DomainError> {
        self.enroll_uc.execute(identity, image).await
    }

    pub fn list(&self) -> Vec<RecordSummary> {
        self.gallery_uc.list()
    }

    pub async fn forget(&self, identity: &str) -> Result<Forgotten, DomainError> {
        self.gallery_uc.forget(identity).await
    }

    /// Removes the record only; the gallery file, if any, stays on disk.
    pub fn remove(&self, identity: &str) -> bool {
        self.store.remove(identity)
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn snapshot(&self) -> GallerySnapshot {
        self.store.snapshot()
    }

    pub fn gallery_dir(&self) -> &std::path::Path {
        self.ingest_uc.gallery().root()
    }
}
