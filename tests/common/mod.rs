//! Shared test helpers.
#![allow(dead_code)]

use facematch::config::Settings;
use facematch::domain::error::DomainError;
use facematch::domain::ports::feature_extractor::FeatureExtractor;
use facematch::infrastructure::watcher::IngestEvent;
use facematch::FaceMatch;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

/// Deterministic extractor: image bytes are the embedding written as
/// comma-separated floats. Anything else is a corrupt image.
#[derive(Default)]
pub struct FakeExtractor {
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FakeExtractor {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl FeatureExtractor for FakeExtractor {
    async fn extract(&self, image: &[u8]) -> Result<Vec<f32>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let text = std::str::from_utf8(image)
            .map_err(|_| DomainError::Extraction("not a face".into()))?;
        let vector = text
            .trim()
            .split(',')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Extraction(format!("no face detected: {e}")))?;
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        0
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Image bytes the fake extractor turns into `vector`.
pub fn face(vector: &[f32]) -> Vec<u8> {
    vector
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
        .into_bytes()
}

/// Unit vector in the plane at cosine distance `d` from `[1, 0]`.
pub fn at_distance(d: f64) -> Vec<f32> {
    let cos = 1.0 - d;
    vec![cos as f32, (1.0 - cos * cos).sqrt() as f32]
}

pub fn settings(dir: &Path) -> Settings {
    Settings {
        gallery_dir: dir.to_path_buf(),
        settle_delay: Duration::from_millis(50),
        query_timeout: Duration::from_secs(2),
        ..Settings::default()
    }
}

pub fn setup(dir: &Path) -> FaceMatch {
    FaceMatch::with_extractor(settings(dir), Arc::new(FakeExtractor::default())).unwrap()
}

pub fn write_face(dir: &Path, name: &str, vector: &[f32]) {
    std::fs::write(dir.join(name), face(vector)).unwrap();
}

/// Waits for the first event matching `pred`, skipping others.
pub async fn wait_for(
    rx: &mut broadcast::Receiver<IngestEvent>,
    timeout: Duration,
    mut pred: impl FnMut(&IngestEvent) -> bool,
) -> Option<IngestEvent> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Ok(event)) if pred(&event) => return Some(event),
            Ok(Ok(_)) | Ok(Err(RecvError::Lagged(_))) => continue,
            Ok(Err(RecvError::Closed)) | Err(_) => return None,
        }
    }
}
