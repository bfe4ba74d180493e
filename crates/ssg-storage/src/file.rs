//! Content file model.
//!
//! A [`ContentFile`] is one source file after front-matter extraction: its
//! slash-normalized path relative to the content root, its absolute storage
//! identity, the parsed [`Meta`], and the remaining body bytes.

use std::path::{Path, PathBuf};

use crate::front_matter::extract_front_matter;
use crate::storage::StorageError;

/// Front-matter metadata of a content file.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// A source file travelling through the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentFile {
    /// Output path relative to the content root, always with `/` separators.
    ///
    /// Rendering trims consumed renderer extensions from this path, so after a
    /// render `page.html.tmpl` reads `page.html`.
    pub relative_path: String,
    /// Absolute path of the source file. Never changes; used as identity.
    pub source_path: PathBuf,
    /// Parsed front matter (empty when the file has none).
    pub meta: Meta,
    /// Body bytes with the front-matter block removed.
    pub contents: Vec<u8>,
    /// Canonical site URL, computed when the file is scaffolded.
    pub url: Option<String>,
}

impl ContentFile {
    /// Create a file with empty metadata.
    ///
    /// Back-slashes in `relative_path` are normalized to forward slashes.
    #[must_use]
    pub fn new(
        relative_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            relative_path: normalize_slashes(relative_path.into()),
            source_path: source_path.into(),
            meta: Meta::new(),
            contents: contents.into(),
            url: None,
        }
    }

    /// Replace the metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Create a file from raw bytes, extracting front matter.
    ///
    /// A `url` key in the front matter is dropped: the URL is assigned when
    /// the site is scaffolded.
    ///
    /// # Errors
    ///
    /// Returns an error if a front-matter block is present but malformed.
    pub fn from_bytes(
        relative_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        bytes: &[u8],
    ) -> Result<Self, StorageError> {
        let source_path = source_path.into();
        let (mut meta, contents) =
            extract_front_matter(bytes).map_err(|e| e.with_path(source_path.clone()))?;
        if meta.remove("url").is_some() {
            tracing::warn!(
                file = %source_path.display(),
                "Front matter key \"url\" is reserved, ignoring it"
            );
        }
        Ok(Self::new(relative_path, source_path, contents).with_meta(meta))
    }

    /// Read a file below `root` and extract its front matter.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, lies outside `root`, or
    /// carries malformed front matter.
    pub async fn load(root: &Path, path: &Path) -> Result<Self, StorageError> {
        let relative = relative_to(root, path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::io(e, Some(path.to_path_buf())))?;
        Self::from_bytes(relative, path, &bytes)
    }

    /// File name component of [`relative_path`](Self::relative_path).
    #[must_use]
    pub fn basename(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map_or(self.relative_path.as_str(), |(_, name)| name)
    }

    /// Name of the parent layout declared in front matter, if any.
    #[must_use]
    pub fn layout(&self) -> Option<&str> {
        self.meta_str("layout").filter(|name| !name.is_empty())
    }

    /// String value of a metadata key.
    #[must_use]
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Compute the slash-separated path of `path` relative to `root`.
pub(crate) fn relative_to(root: &Path, path: &Path) -> Result<String, StorageError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        StorageError::new(crate::StorageErrorKind::InvalidPath).with_path(path)
    })?;
    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

fn normalize_slashes(path: String) -> String {
    if path.contains('\\') {
        path.replace('\\', "/")
    } else {
        path
    }
}
