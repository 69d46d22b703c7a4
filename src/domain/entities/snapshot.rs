use indexmap::IndexMap;
use std::sync::Arc;

use crate::domain::entities::embedding_record::EmbeddingRecord;

pub type RecordMap = IndexMap<String, Arc<EmbeddingRecord>>;

/// Immutable point-in-time view of the gallery.
///
/// Iteration follows first-insertion order of each identity; replacing a
/// record keeps its position, removing one shifts later records up. The
/// matcher relies on this order for tie-breaking.
///
/// Also carries the store's embedding dimension as of publication, so
/// readers can validate a query without touching the writer lock.
#[derive(Debug, Clone, Default)]
pub struct GallerySnapshot {
    records: Arc<RecordMap>,
    dimension: Option<usize>,
}

impl GallerySnapshot {
    pub fn new(records: Arc<RecordMap>, dimension: Option<usize>) -> Self {
        Self { records, dimension }
    }

    /// Fixed embedding dimension, once established.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&EmbeddingRecord> {
        self.records.get(identity).map(Arc::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmbeddingRecord> {
        self.records.values().map(Arc::as_ref)
    }

    pub(crate) fn records(&self) -> &Arc<RecordMap> {
        &self.records
    }
}
