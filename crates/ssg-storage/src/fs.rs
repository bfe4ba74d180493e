//! Filesystem storage implementation.
//!
//! Provides [`FsLayoutSource`] for resolving layouts and partials by name in a
//! directory, and [`scan_sources`] for enumerating a content tree.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use glob::Pattern;

use crate::file::{ContentFile, relative_to};
use crate::storage::{LayoutSource, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem layout lookup with a per-instance cache.
///
/// A name `"page"` matches the first file (in byte order) whose name is
/// `page.<anything>` in the lookup directory. Names may contain `/` to reach
/// into subdirectories.
///
/// The cache lives as long as the source. Create one source per build run so
/// edited layouts are picked up on the next run.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use ssg_storage::{FsLayoutSource, LayoutSource};
///
/// let layouts = FsLayoutSource::new(PathBuf::from("layouts"));
/// let base = layouts.lookup("base").await?;
/// ```
pub struct FsLayoutSource {
    /// Lookup root.
    dir: PathBuf,
    /// Resolved files keyed by lookup name.
    cache: Mutex<HashMap<String, ContentFile>>,
}

impl FsLayoutSource {
    /// Create a layout source rooted at `dir`.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Lookup root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Drop every cached lookup.
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Reject names that could escape the lookup directory.
    fn validate_name(name: &str) -> Result<(), StorageError> {
        let path = Path::new(name);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));

        if name.is_empty() || escapes {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(name)
                .with_backend(BACKEND));
        }
        Ok(())
    }

    fn cached(&self, name: &str) -> Option<ContentFile> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    async fn find(&self, name: &str) -> Result<ContentFile, StorageError> {
        let (sub_dir, stem) = match name.rsplit_once('/') {
            Some((sub_dir, stem)) => (self.dir.join(sub_dir), stem),
            None => (self.dir.clone(), name),
        };
        let pattern = Pattern::new(&format!("{}.*", Pattern::escape(stem))).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(name)
                .with_backend(BACKEND)
                .with_source(e)
        })?;

        let mut entries = match tokio::fs::read_dir(&sub_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::not_found(self.dir.join(name)).with_backend(BACKEND));
            }
            Err(e) => return Err(StorageError::io(e, Some(sub_dir)).with_backend(BACKEND)),
        };

        let mut candidates = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::io(e, Some(sub_dir.clone())).with_backend(BACKEND))?
        {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !pattern.matches_with(&file_name, glob::MatchOptions::new()) {
                continue;
            }
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file {
                candidates.push(entry.path());
            }
        }
        candidates.sort();

        let Some(path) = candidates.into_iter().next() else {
            tracing::debug!(name, dir = %self.dir.display(), "Layout not found");
            return Err(StorageError::not_found(self.dir.join(name)).with_backend(BACKEND));
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::io(e, Some(path.clone())).with_backend(BACKEND))?;
        let relative = relative_to(&self.dir, &path)?;
        tracing::debug!(name, file = %relative, "Resolved layout");
        ContentFile::from_bytes(relative, path, &bytes).map_err(|e| e.with_backend(BACKEND))
    }
}

impl LayoutSource for FsLayoutSource {
    fn lookup<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<ContentFile, StorageError>> {
        Box::pin(async move {
            Self::validate_name(name)?;

            if let Some(file) = self.cached(name) {
                tracing::debug!(name, "Using cached layout");
                return Ok(file);
            }

            let file = self.find(name).await?;
            self.cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(name.to_owned(), file.clone());
            Ok(file)
        })
    }
}

/// Enumerate every regular file below `root`, sorted by path.
///
/// Hidden files and files inside hidden directories are skipped.
///
/// # Errors
///
/// Returns an error if `root` is not a directory or a directory entry cannot
/// be read.
pub fn scan_sources(root: &Path) -> Result<Vec<PathBuf>, StorageError> {
    if !root.is_dir() {
        return Err(StorageError::not_found(root).with_backend(BACKEND));
    }

    let pattern = format!("{}/**/*", Pattern::escape(&root.to_string_lossy()));
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..glob::MatchOptions::new()
    };
    let entries = glob::glob_with(&pattern, options).map_err(|e| {
        StorageError::new(StorageErrorKind::InvalidPath)
            .with_path(root)
            .with_backend(BACKEND)
            .with_source(e)
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            StorageError::io(e.into_error(), Some(path)).with_backend(BACKEND)
        })?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    tracing::debug!(root = %root.display(), file_count = files.len(), "Source scan completed");
    Ok(files)
}
