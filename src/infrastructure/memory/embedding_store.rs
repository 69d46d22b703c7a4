use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;

use crate::domain::entities::embedding_record::EmbeddingRecord;
use crate::domain::entities::snapshot::{GallerySnapshot, RecordMap};
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_store::EmbeddingStore;
use crate::domain::values::distance::validate_embedding;

/// Copy-on-write in-memory gallery.
///
/// Writers serialize on `writer`, build the next map off to the side and
/// publish it with a pointer swap. Readers only hold `current` long enough
/// to clone an `Arc`; the dimension travels with each published snapshot,
/// so no read path takes `writer`.
pub struct InMemoryEmbeddingStore {
    current: RwLock<GallerySnapshot>,
    /// Guards mutation; holds the established dimension.
    writer: Mutex<Option<usize>>,
}

impl InMemoryEmbeddingStore {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(GallerySnapshot::default()),
            writer: Mutex::new(None),
        }
    }

    /// Store whose dimension is fixed up front by the extractor contract.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            current: RwLock::new(GallerySnapshot::new(Arc::default(), Some(dimension))),
            writer: Mutex::new(Some(dimension)),
        }
    }

    fn next_map(&self) -> RecordMap {
        let published = self.current.read().clone();
        published.records().as_ref().clone()
    }

    fn publish(&self, map: RecordMap, dimension: Option<usize>) {
        let next = GallerySnapshot::new(Arc::new(map), dimension);
        *self.current.write() = next;
    }
}

impl Default for InMemoryEmbeddingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingStore for InMemoryEmbeddingStore {
    fn insert_or_replace(&self, record: EmbeddingRecord) -> Result<(), DomainError> {
        validate_embedding(&record.vector)?;
        let mut dimension = self.writer.lock();
        let actual = record.dimension();
        match *dimension {
            Some(expected) if expected != actual => {
                return Err(DomainError::DimensionMismatch { expected, actual });
            }
            Some(_) => {}
            None => *dimension = Some(actual),
        }

        let mut map = self.next_map();
        map.insert(record.identity.to_string(), Arc::new(record));
        self.publish(map, *dimension);
        Ok(())
    }

    fn remove(&self, identity: &str) -> bool {
        let dimension = self.writer.lock();
        if !self.current.read().records().contains_key(identity) {
            return false;
        }
        let mut map = self.next_map();
        map.shift_remove(identity);
        self.publish(map, *dimension);
        true
    }

    fn remove_from_source(&self, identity: &str, source: &Path) -> bool {
        let dimension = self.writer.lock();
        let backed_by_source = self
            .current
            .read()
            .get(identity)
            .is_some_and(|r| r.source.as_deref() == Some(source));
        if !backed_by_source {
            return false;
        }
        let mut map = self.next_map();
        map.shift_remove(identity);
        self.publish(map, *dimension);
        true
    }

    fn snapshot(&self) -> GallerySnapshot {
        self.current.read().clone()
    }

    fn size(&self) -> usize {
        self.current.read().len()
    }

    fn dimension(&self) -> Option<usize> {
        self.current.read().dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::identity::Identity;
    use std::path::PathBuf;

    fn record(name: &str, vector: Vec<f32>) -> EmbeddingRecord {
        EmbeddingRecord::new(Identity::new(name).unwrap(), vector, None)
    }

    #[test]
    fn test_size_counts_distinct_identities() {
        let store = InMemoryEmbeddingStore::new();
        store.insert_or_replace(record("alice", vec![1.0, 0.0])).unwrap();
        store.insert_or_replace(record("bob", vec![0.0, 1.0])).unwrap();
        store.insert_or_replace(record("alice", vec![0.5, 0.5])).unwrap();
        assert_eq!(store.size(), 2);
    }

    #[test]
    fn test_upsert_keeps_latest_vector() {
        let store = InMemoryEmbeddingStore::new();
        store.insert_or_replace(record("alice", vec![1.0, 0.0])).unwrap();
        store.insert_or_replace(record("alice", vec![0.0, 1.0])).unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get("alice").unwrap().vector, vec![0.0, 1.0]);
    }

    #[test]
    fn test_upsert_keeps_iteration_position() {
        let store = InMemoryEmbeddingStore::new();
        store.insert_or_replace(record("alice", vec![1.0, 0.0])).unwrap();
        store.insert_or_replace(record("bob", vec![0.0, 1.0])).unwrap();
        store.insert_or_replace(record("alice", vec![0.5, 0.5])).unwrap();

        let order: Vec<_> = store.snapshot().iter().map(|r| r.identity.to_string()).collect();
        assert_eq!(order, vec!["alice", "bob"]);
    }

    #[test]
    fn test_first_insert_fixes_dimension() {
        let store = InMemoryEmbeddingStore::new();
        assert_eq!(store.dimension(), None);
        store.insert_or_replace(record("alice", vec![1.0, 0.0, 0.0])).unwrap();
        assert_eq!(store.dimension(), Some(3));

        let err = store.insert_or_replace(record("bob", vec![1.0, 0.0])).unwrap_err();
        assert!(matches!(
            err,
            DomainError::DimensionMismatch { expected: 3, actual: 2 }
        ));
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn test_dimension_mismatch_keeps_prior_record() {
        let store = InMemoryEmbeddingStore::with_dimension(2);
        store.insert_or_replace(record("alice", vec![1.0, 0.0])).unwrap();
        assert!(store.insert_or_replace(record("alice", vec![1.0, 0.0, 0.0])).is_err());
        assert_eq!(store.snapshot().get("alice").unwrap().vector, vec![1.0, 0.0]);
    }

    #[test]
    fn test_rejects_unusable_vectors() {
        let store = InMemoryEmbeddingStore::new();
        assert!(store.insert_or_replace(record("alice", vec![])).is_err());
        assert!(store.insert_or_replace(record("alice", vec![1.0, f32::NAN])).is_err());
        assert_eq!(store.dimension(), None);
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_reads_do_not_wait_for_writer() {
        let store = InMemoryEmbeddingStore::with_dimension(2);
        store.insert_or_replace(record("alice", vec![1.0, 0.0])).unwrap();

        let guard = store.writer.lock();
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::scope(|s| {
            let store = &store;
            s.spawn(move || {
                let snap = store.snapshot();
                let _ = tx.send((store.dimension(), store.size(), snap.dimension()));
            });
            let got = rx.recv_timeout(std::time::Duration::from_secs(1));
            drop(guard);
            assert_eq!(got.unwrap(), (Some(2), 1, Some(2)));
        });
    }

    #[test]
    fn test_snapshot_carries_dimension() {
        let store = InMemoryEmbeddingStore::new();
        assert_eq!(store.snapshot().dimension(), None);
        store.insert_or_replace(record("alice", vec![1.0, 0.0, 0.0])).unwrap();
        let snap = store.snapshot();
        store.remove("alice");
        assert_eq!(snap.dimension(), Some(3));
        assert_eq!(store.snapshot().dimension(), Some(3));
    }

    #[test]
    fn test_remove() {
        let store = InMemoryEmbeddingStore::new();
        store.insert_or_replace(record("alice", vec![1.0])).unwrap();
        assert!(store.remove("alice"));
        assert!(!store.remove("alice"));
        assert_eq!(store.size(), 0);
        // dimension survives the gallery emptying out
        assert_eq!(store.dimension(), Some(1));
    }

    #[test]
    fn test_remove_from_source_checks_backing_file() {
        let store = InMemoryEmbeddingStore::new();
        let png = PathBuf::from("/faces/alice.png");
        store
            .insert_or_replace(EmbeddingRecord::new(
                Identity::new("alice").unwrap(),
                vec![1.0],
                Some(png.clone()),
            ))
            .unwrap();

        assert!(!store.remove_from_source("alice", &PathBuf::from("/faces/alice.jpg")));
        assert_eq!(store.size(), 1);
        assert!(store.remove_from_source("alice", &png));
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let store = InMemoryEmbeddingStore::new();
        store.insert_or_replace(record("alice", vec![1.0, 0.0])).unwrap();
        let before = store.snapshot();

        store.insert_or_replace(record("bob", vec![0.0, 1.0])).unwrap();
        store.insert_or_replace(record("alice", vec![0.0, 1.0])).unwrap();
        store.remove("alice");

        assert_eq!(before.len(), 1);
        assert_eq!(before.get("alice").unwrap().vector, vec![1.0, 0.0]);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_concurrent_inserts_are_all_visible() {
        let store = InMemoryEmbeddingStore::new();
        let dim = 64;
        std::thread::scope(|s| {
            for t in 0..8 {
                let store = &store;
                s.spawn(move || {
                    for i in 0..25 {
                        let v = vec![(t * 100 + i) as f32; dim];
                        store
                            .insert_or_replace(record(&format!("id-{t}-{i}"), v))
                            .unwrap();
                    }
                });
            }
            // concurrent readers never see torn records
            for _ in 0..4 {
                let store = &store;
                s.spawn(move || {
                    for _ in 0..50 {
                        let snap = store.snapshot();
                        assert!(snap.iter().all(|r| r.vector.len() == dim));
                    }
                });
            }
        });

        let snap = store.snapshot();
        assert_eq!(snap.len(), 200);
        assert!(snap.iter().all(|r| r.vector.len() == dim));
    }
}
