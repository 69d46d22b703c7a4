use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::error::DomainError;
use crate::domain::values::threshold::Threshold;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtractorKind {
    #[default]
    Thumbnail,
    Http,
}

impl FromStr for ExtractorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thumbnail" => Ok(Self::Thumbnail),
            "http" => Ok(Self::Http),
            _ => Err(format!(
                "Unknown extractor: '{s}'. Use 'thumbnail' or 'http'"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub gallery_dir: PathBuf,
    pub threshold: Threshold,
    pub settle_delay: Duration,
    pub query_timeout: Duration,
    pub extractor: ExtractorKind,
    pub extractor_url: Option<String>,
    pub extractor_dimension: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gallery_dir: PathBuf::from("./known_faces"),
            threshold: Threshold::default(),
            settle_delay: Duration::from_millis(1000),
            query_timeout: Duration::from_millis(10_000),
            extractor: ExtractorKind::default(),
            extractor_url: None,
            extractor_dimension: None,
        }
    }
}

impl Settings {
    /// Defaults overridden by `FACEMATCH_*` environment variables.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let mut settings = Settings::default();
        if let Some(dir) = lookup("FACEMATCH_GALLERY_DIR") {
            settings.gallery_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("FACEMATCH_THRESHOLD") {
            let value = parse_var::<f64>("FACEMATCH_THRESHOLD", &raw)?;
            settings.threshold = Threshold::new(value).map_err(DomainError::InvalidInput)?;
        }
        if let Some(raw) = lookup("FACEMATCH_SETTLE_MS") {
            settings.settle_delay = Duration::from_millis(parse_var("FACEMATCH_SETTLE_MS", &raw)?);
        }
        if let Some(raw) = lookup("FACEMATCH_QUERY_TIMEOUT_MS") {
            let ms: u64 = parse_var("FACEMATCH_QUERY_TIMEOUT_MS", &raw)?;
            if ms == 0 {
                return Err("FACEMATCH_QUERY_TIMEOUT_MS must be positive".into());
            }
            settings.query_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("FACEMATCH_EXTRACTOR") {
            settings.extractor = raw.parse().map_err(DomainError::InvalidInput)?;
        }
        settings.extractor_url = lookup("FACEMATCH_EXTRACTOR_URL").filter(|u| !u.trim().is_empty());
        if let Some(raw) = lookup("FACEMATCH_EXTRACTOR_DIM") {
            settings.extractor_dimension = Some(parse_var("FACEMATCH_EXTRACTOR_DIM", &raw)?);
        }
        Ok(settings)
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T, DomainError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| DomainError::InvalidInput(format!("{key}={raw}: {e}")))
}
