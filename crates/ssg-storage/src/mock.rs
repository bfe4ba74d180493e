//! Mock layout source for testing.
//!
//! Provides [`MockLayoutSource`] for unit testing without filesystem access.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use futures::future::BoxFuture;

use crate::file::ContentFile;
use crate::storage::{LayoutSource, StorageError};

/// In-memory layout source.
///
/// # Example
///
/// ```ignore
/// use ssg_storage::{LayoutSource, MockLayoutSource};
///
/// let layouts = MockLayoutSource::new()
///     .with_layout("base", "base.html.tmpl", "<html>{{ content }}</html>");
///
/// let base = layouts.lookup("base").await?;
/// ```
#[derive(Debug, Default)]
pub struct MockLayoutSource {
    files: RwLock<HashMap<String, ContentFile>>,
    lookups: RwLock<Vec<String>>,
}

impl MockLayoutSource {
    /// Create a new empty mock source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a layout from raw text (front matter is extracted).
    ///
    /// The source path is `/mock/<relative_path>`.
    ///
    /// # Panics
    ///
    /// Panics if `contents` carries malformed front matter.
    #[must_use]
    pub fn with_layout(
        self,
        name: impl Into<String>,
        relative_path: impl Into<String>,
        contents: impl AsRef<[u8]>,
    ) -> Self {
        let relative_path = relative_path.into();
        let source_path = PathBuf::from("/mock").join(&relative_path);
        let file = ContentFile::from_bytes(relative_path, source_path, contents.as_ref())
            .expect("mock layout front matter must be valid");
        self.with_file(name, file)
    }

    /// Register an already built file under `name`.
    #[must_use]
    pub fn with_file(self, name: impl Into<String>, file: ContentFile) -> Self {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), file);
        self
    }

    /// Names requested so far, in call order.
    #[must_use]
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LayoutSource for MockLayoutSource {
    fn lookup<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<ContentFile, StorageError>> {
        Box::pin(async move {
            self.lookups
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(name.to_owned());

            self.files
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(name)
                .cloned()
                .ok_or_else(|| StorageError::not_found(name).with_backend("Mock"))
        })
    }
}
