use crate::domain::error::DomainError;

/// Distance reported for vectors that cannot be compared: zero-norm or of
/// different lengths. Equal to the distance between opposite vectors.
pub const MAX_COSINE_DISTANCE: f64 = 2.0;

/// Cosine distance `1 - cos(a, b)`, in `[0, 2]`. Accumulates in f64.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return MAX_COSINE_DISTANCE;
    }
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return MAX_COSINE_DISTANCE;
    }
    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    1.0 - similarity
}

/// Rejects embeddings that cannot take part in matching.
pub fn validate_embedding(vector: &[f32]) -> Result<(), DomainError> {
    if vector.is_empty() {
        return Err(DomainError::InvalidInput("Embedding is empty".to_string()));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(DomainError::InvalidInput(
            "Embedding contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Rounds a distance to 4 decimal places for reporting.
pub fn round_distance(distance: f64) -> f64 {
    (distance * 10_000.0).round() / 10_000.0
}
