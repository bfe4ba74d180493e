//! Storage collaborators for the ssg site generator.
//!
//! This crate owns everything that touches bytes on disk before the
//! rendering core sees them:
//!
//! - [`ContentFile`] and its front-matter [`Meta`]
//! - [`extract_front_matter`] for `---` delimited YAML headers
//! - [`LayoutSource`] trait for name-based template lookup, with the
//!   filesystem implementation [`FsLayoutSource`]
//! - [`scan_sources`] for enumerating a content tree
//! - [`MockLayoutSource`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use ssg_storage::{FsLayoutSource, LayoutSource};
//!
//! let layouts = FsLayoutSource::new(PathBuf::from("layouts"));
//! let page = layouts.lookup("page").await?;
//! println!("{} -> {:?}", page.relative_path, page.layout());
//! ```

mod file;
mod front_matter;
mod fs;
#[cfg(feature = "mock")]
mod mock;
mod storage;

pub use file::{ContentFile, Meta};
pub use front_matter::extract_front_matter;
pub use fs::{FsLayoutSource, scan_sources};
#[cfg(feature = "mock")]
pub use mock::MockLayoutSource;
pub use storage::{LayoutSource, StorageError, StorageErrorKind};
