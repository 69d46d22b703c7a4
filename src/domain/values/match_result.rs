use serde::{Deserialize, Serialize};

use crate::domain::values::identity::Identity;

/// Outcome of matching a query face against the gallery.
///
/// `identity` and `distance` are only present when `matched` is true; the
/// nearest neighbor of a rejected query is never disclosed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched: bool,
    pub identity: Option<Identity>,
    pub distance: Option<f64>,
}

impl MatchResult {
    pub fn matched(identity: Identity, distance: f64) -> Self {
        Self {
            matched: true,
            identity: Some(identity),
            distance: Some(distance),
        }
    }

    pub fn unmatched() -> Self {
        Self {
            matched: false,
            identity: None,
            distance: None,
        }
    }
}
