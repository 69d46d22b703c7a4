use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Image formats the gallery recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpg,
    Jpeg,
    Png,
}

impl ImageKind {
    pub const ALL: [ImageKind; 3] = [ImageKind::Jpg, ImageKind::Jpeg, ImageKind::Png];

    /// Kind of a gallery file, judged by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }

    /// Kind of an uploaded image, judged by its magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageKind::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpg)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpg => "jpg",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Png => "png",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ImageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpg" => Ok(ImageKind::Jpg),
            "jpeg" => Ok(ImageKind::Jpeg),
            "png" => Ok(ImageKind::Png),
            _ => Err(format!("Unsupported image extension: {s}")),
        }
    }
}
