//! Exact nearest-neighbor matching over a gallery snapshot.
//!
//! A linear scan is O(N·D) per query, which is fine for galleries of a few
//! thousand identities.

use crate::domain::entities::embedding_record::EmbeddingRecord;
use crate::domain::entities::snapshot::GallerySnapshot;
use crate::domain::values::distance::{cosine_distance, round_distance};
use crate::domain::values::match_result::MatchResult;
use crate::domain::values::threshold::Threshold;

/// Nearest record to `query` and its (unrounded) cosine distance.
///
/// On equal distances the record met first in snapshot order wins.
pub fn nearest<'a>(
    query: &[f32],
    snapshot: &'a GallerySnapshot,
) -> Option<(&'a EmbeddingRecord, f64)> {
    let mut best: Option<(&EmbeddingRecord, f64)> = None;
    for record in snapshot.iter() {
        let distance = cosine_distance(query, &record.vector);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((record, distance)),
        }
    }
    best
}

/// Accepts the nearest record when its distance is strictly below
/// `threshold`. A rejected query reveals neither identity nor distance.
pub fn find_match(query: &[f32], snapshot: &GallerySnapshot, threshold: Threshold) -> MatchResult {
    match nearest(query, snapshot) {
        Some((record, distance)) if threshold.accepts(distance) => {
            MatchResult::matched(record.identity.clone(), round_distance(distance))
        }
        _ => MatchResult::unmatched(),
    }
}
