//! File Image Reader
//!
//! Reads photos referenced by `file://` URIs or plain paths.

use std::path::{Path, PathBuf};

use crate::domain::repository::ImageReader;
use crate::domain::value_object::ImagePayload;
use crate::error::{ListingError, ListingResult};

/// Reads images from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FsImageReader {
    /// Relative paths resolve against this directory
    root: Option<PathBuf>,
}

impl FsImageReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, uri: &str) -> ListingResult<PathBuf> {
        let raw = uri.strip_prefix("file://").unwrap_or(uri).trim();
        if raw.is_empty() {
            return Err(ListingError::Image("empty image reference".to_string()));
        }
        if raw.contains("://") {
            return Err(ListingError::Image(format!("unsupported image reference {uri}")));
        }
        let path = Path::new(raw);
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        })
    }
}

impl ImageReader for FsImageReader {
    async fn read(&self, uri: &str) -> ListingResult<ImagePayload> {
        let path = self.resolve(uri)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| ListingError::Image(format!("{}: {e}", path.display())))?;

        let mime_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());

        tracing::debug!(path = %path.display(), mime_type = %mime_type, bytes = bytes.len(), "Read image");
        Ok(ImagePayload::new(bytes, mime_type, file_name))
    }
}
