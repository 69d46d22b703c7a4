use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::values::identity::Identity;

/// A gallery entry: one identity and the embedding extracted from its image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub identity: Identity,
    pub vector: Vec<f32>,
    /// Gallery file the embedding was extracted from, if any.
    pub source: Option<PathBuf>,
    pub inserted_at: DateTime<Utc>,
}

impl EmbeddingRecord {
    pub fn new(identity: Identity, vector: Vec<f32>, source: Option<PathBuf>) -> Self {
        Self {
            identity,
            vector,
            source,
            inserted_at: Utc::now(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Listing view of a record, without the vector.
#[derive(Debug, Clone, Serialize)]
pub struct RecordSummary {
    pub identity: Identity,
    pub dimension: usize,
    pub source: Option<PathBuf>,
    pub inserted_at: DateTime<Utc>,
}

impl From<&EmbeddingRecord> for RecordSummary {
    fn from(record: &EmbeddingRecord) -> Self {
        Self {
            identity: record.identity.clone(),
            dimension: record.dimension(),
            source: record.source.clone(),
            inserted_at: record.inserted_at,
        }
    }
}
