use crate::domain::entities::embedding_record::EmbeddingRecord;
use crate::domain::entities::snapshot::GallerySnapshot;
use crate::domain::error::DomainError;

/// Mutable gallery of embeddings keyed by identity.
///
/// Mutations are serialized; readers work against [`GallerySnapshot`]s and
/// never observe a partially applied mutation.
pub trait EmbeddingStore: Send + Sync {
    /// Upsert by identity. The first accepted vector fixes the store's
    /// dimension; later vectors of another length are rejected with
    /// [`DomainError::DimensionMismatch`] and the prior record is kept.
    fn insert_or_replace(&self, record: EmbeddingRecord) -> Result<(), DomainError>;

    /// Removes the record for `identity`. Returns true if one existed.
    fn remove(&self, identity: &str) -> bool;

    /// Removes the record for `identity` only if it was extracted from
    /// `source`. Returns true if a record was removed.
    fn remove_from_source(&self, identity: &str, source: &std::path::Path) -> bool;

    fn snapshot(&self) -> GallerySnapshot;

    fn size(&self) -> usize;

    /// Fixed embedding dimension, once established.
    fn dimension(&self) -> Option<usize>;
}
