//! Filesystem side of the gallery: the directory of known-identity images.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::error::DomainError;
use crate::domain::values::identity::Identity;
use crate::domain::values::image_kind::ImageKind;

/// Suffix of in-flight enrollment files; never a recognized image kind.
const PARTIAL_SUFFIX: &str = "part";

/// Enrollment image written to a hidden temp file. Invisible to listings
/// and watchers until [`GalleryDir::commit`] renames it into place.
#[derive(Debug)]
pub struct StagedImage {
    tmp: PathBuf,
    target: PathBuf,
    identity: Identity,
    kind: ImageKind,
}

impl StagedImage {
    /// Path the image will have once committed.
    pub fn target(&self) -> &Path {
        &self.target
    }
}

#[derive(Debug, Clone)]
pub struct GalleryDir {
    root: PathBuf,
}

impl GalleryDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unavailable(&self, err: impl ToString) -> DomainError {
        DomainError::DirectoryUnavailable {
            path: self.root.clone(),
            reason: err.to_string(),
        }
    }

    /// Fails with [`DomainError::DirectoryUnavailable`] unless the root is a
    /// readable directory.
    pub fn check_available(&self) -> Result<(), DomainError> {
        let meta = std::fs::metadata(&self.root).map_err(|e| self.unavailable(e))?;
        if !meta.is_dir() {
            return Err(self.unavailable("not a directory"));
        }
        Ok(())
    }

    /// Gallery image paths directly under the root, sorted by file name.
    /// Hidden files and unrecognized extensions are skipped.
    pub fn list_images(&self) -> Result<Vec<PathBuf>, DomainError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| self.unavailable(e))?;
        let mut images = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.unavailable(e))?;
            let path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_file() => {}
                Ok(ft) if ft.is_symlink() && path.is_file() => {}
                _ => continue,
            }
            if is_gallery_image(&path) {
                images.push(path);
            }
        }
        images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(images)
    }

    pub fn path_for(&self, identity: &Identity, kind: ImageKind) -> PathBuf {
        self.root.join(format!("{identity}.{kind}"))
    }

    /// Writes `bytes` to a hidden temp file destined for
    /// `<identity>.<kind>`. Nothing in the gallery changes until commit.
    pub async fn stage_image(
        &self,
        identity: &Identity,
        kind: ImageKind,
        bytes: &[u8],
    ) -> Result<StagedImage, DomainError> {
        let tmp = self.root.join(format!(
            ".{identity}.{}.{PARTIAL_SUFFIX}",
            uuid::Uuid::new_v4().simple()
        ));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(StagedImage {
            tmp,
            target: self.path_for(identity, kind),
            identity: identity.clone(),
            kind,
        })
    }

    /// Renames a staged image into place, replacing any existing file, then
    /// removes other image files for the same identity.
    ///
    /// Only the rename can fail; a sibling that cannot be removed is logged
    /// and left behind.
    pub async fn commit(&self, staged: StagedImage) -> Result<PathBuf, DomainError> {
        if let Err(e) = tokio::fs::rename(&staged.tmp, &staged.target).await {
            let _ = tokio::fs::remove_file(&staged.tmp).await;
            return Err(e.into());
        }

        for other in ImageKind::ALL.into_iter().filter(|k| *k != staged.kind) {
            let sibling = self.path_for(&staged.identity, other);
            match tokio::fs::remove_file(&sibling).await {
                Ok(()) => debug!(path = %sibling.display(), "removed superseded gallery image"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    path = %sibling.display(),
                    error = %e,
                    "failed to remove superseded image"
                ),
            }
        }
        Ok(staged.target)
    }

    /// Drops a staged image without touching the gallery.
    pub async fn discard(&self, staged: StagedImage) {
        if let Err(e) = tokio::fs::remove_file(&staged.tmp).await {
            warn!(path = %staged.tmp.display(), error = %e, "failed to remove staged image");
        }
    }

    /// Deletes every image file backing `identity`; returns the deleted paths.
    pub async fn remove_images(&self, identity: &Identity) -> Result<Vec<PathBuf>, DomainError> {
        let mut removed = Vec::new();
        for kind in ImageKind::ALL {
            let path = self.path_for(identity, kind);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed.push(path),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}

/// True for non-hidden files with a recognized image extension.
pub fn is_gallery_image(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map_or(true, |n| n.starts_with('.'));
    !hidden && ImageKind::from_path(path).is_some()
}
