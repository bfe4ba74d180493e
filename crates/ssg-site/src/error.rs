//! Render error types.

use std::path::PathBuf;

use ssg_storage::StorageError;

/// Boxed error produced by renderers and helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned when rendering a content file fails.
///
/// Every variant names the file it happened in. Errors raised while rendering
/// one of a page's layouts are wrapped in [`RenderError::InLayout`] so the
/// message points at both the page and the template responsible.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A layout or partial lookup found nothing.
    #[error("Unable to find \"{name}\" {what} for {file}")]
    NotFound {
        /// `"layout"` or `"partial"`.
        what: &'static str,
        /// Name that was looked up.
        name: String,
        /// File that requested the lookup.
        file: String,
        #[source]
        source: StorageError,
    },
    /// A layout or partial lookup failed for another reason.
    #[error("Unable to load \"{name}\" {what} for {file}: {source}")]
    Lookup {
        /// `"layout"` or `"partial"`.
        what: &'static str,
        /// Name that was looked up.
        name: String,
        /// File that requested the lookup.
        file: String,
        #[source]
        source: StorageError,
    },
    /// A layout chain refers back to a file already in the chain.
    #[error(
        "Recursive layout reference in {file}: \"{layout}\" ({}) is already part of the chain",
        .layout_path.display()
    )]
    RecursiveLayout {
        /// Content file whose chain was being resolved.
        file: String,
        /// Offending layout name.
        layout: String,
        /// Storage identity of the offending layout.
        layout_path: PathBuf,
    },
    /// No renderer is registered for an extension.
    #[error("No renderer for \"{extension}\" extension when rendering {file}")]
    NoRenderer {
        /// Extension including the leading dot.
        extension: String,
        /// File being rendered.
        file: String,
    },
    /// A renderer failed.
    #[error("Error while rendering {file} file with \"{extension}\" renderer: {source}")]
    Renderer {
        /// File being rendered.
        file: String,
        /// Extension including the leading dot.
        extension: String,
        #[source]
        source: BoxError,
    },
    /// A renderer finished without producing a buffer.
    #[error("The content returned from \"{extension}\" renderer for {file} is invalid: {reason}")]
    InvalidRendererOutput {
        /// File being rendered.
        file: String,
        /// Extension including the leading dot.
        extension: String,
        /// What was wrong with the output.
        reason: String,
    },
    /// Output references a post-process token this render never registered.
    #[error("Unknown post-process token {token} in {file}")]
    UnknownToken {
        /// File being rendered.
        file: String,
        /// The literal token text.
        token: String,
    },
    /// A failure inside one of the page's layouts.
    #[error("While rendering {origin} (layout {position} of its chain): {source}")]
    InLayout {
        /// Content file at the head of the chain.
        origin: String,
        /// Position in the chain (1 = immediate layout).
        position: usize,
        #[source]
        source: Box<RenderError>,
    },
}

/// Semantic render error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RenderErrorKind {
    /// Layout or partial not found.
    NotFound,
    /// Layout or partial could not be loaded.
    Storage,
    /// Cyclic layout chain.
    RecursiveReference,
    /// Missing renderer.
    NoRenderer,
    /// Renderer returned an error.
    Renderer,
    /// Renderer produced no usable buffer.
    InvalidRendererOutput,
    /// Unregistered post-process token.
    UnknownToken,
}

impl RenderError {
    /// Semantic category, looking through [`RenderError::InLayout`] wrappers.
    #[must_use]
    pub fn kind(&self) -> RenderErrorKind {
        match self {
            Self::NotFound { .. } => RenderErrorKind::NotFound,
            Self::Lookup { .. } => RenderErrorKind::Storage,
            Self::RecursiveLayout { .. } => RenderErrorKind::RecursiveReference,
            Self::NoRenderer { .. } => RenderErrorKind::NoRenderer,
            Self::Renderer { .. } => RenderErrorKind::Renderer,
            Self::InvalidRendererOutput { .. } => RenderErrorKind::InvalidRendererOutput,
            Self::UnknownToken { .. } => RenderErrorKind::UnknownToken,
            Self::InLayout { source, .. } => source.kind(),
        }
    }

    /// Wrap a storage failure for a `what` lookup requested by `file`.
    pub(crate) fn lookup(what: &'static str, name: &str, file: &str, source: StorageError) -> Self {
        if source.is_not_found() {
            Self::NotFound {
                what,
                name: name.to_owned(),
                file: file.to_owned(),
                source,
            }
        } else {
            Self::Lookup {
                what,
                name: name.to_owned(),
                file: file.to_owned(),
                source,
            }
        }
    }
}

/// Signal that a callback-style renderer dropped its completion handle.
#[derive(Debug, thiserror::Error)]
#[error("renderer completed without producing output")]
pub struct MissingOutput;
