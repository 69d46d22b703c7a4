use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::domain::values::image_kind::ImageKind;

const MAX_IDENTITY_BYTES: usize = 255;

/// Gallery key for a known person. Doubles as the file stem of the image
/// backing the record, so it must be usable as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Result<Self, String> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err("Identity must not be empty".to_string());
        }
        if value.len() > MAX_IDENTITY_BYTES {
            return Err(format!(
                "Identity must be at most {MAX_IDENTITY_BYTES} bytes, got {}",
                value.len()
            ));
        }
        if value.starts_with('.') {
            return Err(format!("Identity must not start with '.': {value}"));
        }
        if value.chars().any(|c| c == '/' || c == '\\' || c.is_control()) {
            return Err(format!(
                "Identity must not contain path separators or control characters: {value:?}"
            ));
        }
        Ok(Identity(value))
    }

    /// Identity for a gallery image path: the file stem, provided the
    /// extension is a recognized image format.
    pub fn from_image_path(path: &Path) -> Option<Self> {
        ImageKind::from_path(path)?;
        let stem = path.file_stem()?.to_str()?;
        Identity::new(stem).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Identity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identity::new(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Identity::new(value)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_identities() {
        assert!(Identity::new("alice").is_ok());
        assert!(Identity::new("Bob Smith").is_ok());
        assert!(Identity::new("carol.v2").is_ok());
    }

    #[test]
    fn test_rejects_unsafe_identities() {
        assert!(Identity::new("").is_err());
        assert!(Identity::new("   ").is_err());
        assert!(Identity::new("../etc/passwd").is_err());
        assert!(Identity::new("a/b").is_err());
        assert!(Identity::new("a\\b").is_err());
        assert!(Identity::new(".hidden").is_err());
        assert!(Identity::new("tab\there").is_err());
        assert!(Identity::new("x".repeat(256)).is_err());
    }

    #[test]
    fn test_from_image_path_uses_stem() {
        let id = Identity::from_image_path(&PathBuf::from("/faces/alice.JPG")).unwrap();
        assert_eq!(id.as_str(), "alice");

        let id = Identity::from_image_path(&PathBuf::from("faces/bob.smith.png")).unwrap();
        assert_eq!(id.as_str(), "bob.smith");
    }

    #[test]
    fn test_from_image_path_ignores_other_files() {
        assert!(Identity::from_image_path(&PathBuf::from("notes.txt")).is_none());
        assert!(Identity::from_image_path(&PathBuf::from("alice")).is_none());
        assert!(Identity::from_image_path(&PathBuf::from(".alice.1234.part")).is_none());
        assert!(Identity::from_image_path(&PathBuf::from(".png")).is_none());
    }
}
