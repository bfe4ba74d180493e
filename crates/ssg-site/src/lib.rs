//! Layout chains, navigation and extension rendering for ssg.
//!
//! This crate provides:
//! - [`make_url`]: canonical page URLs with index-file collapsing
//! - [`Navigation`]: the site navigation tree and per-page views
//! - [`build_chain`] and [`ChainRenderer`]: layout inheritance and rendering
//! - [`RendererRegistry`]: per-extension renderers
//! - [`scaffold`]: URL assignment and navigation views for a set of pages
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use ssg_site::{ChainRenderer, ScaffoldOptions, scaffold};
//! use ssg_storage::FsLayoutSource;
//!
//! let registry = Arc::new(ssg_renderer::defaults());
//! let site = scaffold(&mut files, &ScaffoldOptions::for_registry(&registry));
//! let layouts = Arc::new(FsLayoutSource::new("layouts".into()));
//! let renderer = ChainRenderer::new(registry, layouts);
//!
//! for (index, file) in files.iter_mut().enumerate() {
//!     renderer.render(file, site.view(index)).await?;
//! }
//! ```

mod chain;
mod context;
mod error;
mod navigation;
mod partial;
mod postprocess;
mod registry;
mod render;
mod scaffold;
mod url;

pub use chain::{build_chain, merge_chain_meta};
pub use context::{Extensions, FnHelper, Helper, RenderContext, helper_fn};
pub use error::{BoxError, MissingOutput, RenderError, RenderErrorKind};
pub use navigation::{NavEntry, NavItem, NavOptions, Navigation, Selection};
pub use partial::PartialHelper;
pub use postprocess::{TOKEN_PREFIX, post_process_token};
pub use registry::{
    AsyncFnRenderer, CallbackRenderer, Completion, FnRenderer, RenderOutput, Renderer,
    RendererRegistry, async_renderer, callback_renderer, renderer_fn,
};
pub use render::{ChainRenderer, FileRender, RenderedPage, render_file};
pub use scaffold::{Scaffold, ScaffoldOptions, scaffold};
pub use url::{IndexPattern, NameResolver, make_url};
