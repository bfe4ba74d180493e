//! Built-in renderers for ssg.
//!
//! - [`markdown`]: CommonMark plus tables, footnotes, strikethrough and task
//!   lists, rendered with `pulldown-cmark`
//! - [`template`]: a small `{{ placeholder }}` language for layouts and
//!   partials
//!
//! [`defaults`] registers both under their usual extensions.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ssg_site::ChainRenderer;
//! use ssg_storage::FsLayoutSource;
//!
//! let registry = Arc::new(ssg_renderer::defaults());
//! let renderer = ChainRenderer::new(registry, Arc::new(FsLayoutSource::new("layouts".into())));
//! let html = renderer.render(&mut file, None).await?;
//! ```

mod markdown;
mod template;

pub use markdown::{markdown, markdown_options, render_markdown};
pub use template::{TemplateError, escape_html, navigation_html, render_template, template};

use ssg_site::RendererRegistry;

/// Registry with `md` mapped to [`markdown`] and `tmpl` to [`template`].
#[must_use]
pub fn defaults() -> RendererRegistry {
    RendererRegistry::new()
        .with("md", markdown())
        .with("tmpl", template())
}
