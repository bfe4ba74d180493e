//! Partial templates.
//!
//! [`PartialHelper`] lets a template embed another template by name:
//! `{{ partial footer }}`. The partial is looked up and rendered only after
//! the page's layout chain has finished, through a post-process token, so it
//! sees the page's final context.

use std::sync::Arc;

use ssg_storage::LayoutSource;

use crate::context::{Extensions, Helper, RenderContext};
use crate::error::{BoxError, RenderError};
use crate::registry::RendererRegistry;
use crate::render::render_file;

/// Helper rendering named partials.
///
/// Arguments are the partial name followed by optional `key=value` pairs,
/// which are added to the partial's extension values.
pub struct PartialHelper {
    partials: Arc<dyn LayoutSource>,
    registry: Arc<RendererRegistry>,
}

impl PartialHelper {
    /// Create a helper resolving partials from `partials` and rendering them
    /// with `registry`.
    #[must_use]
    pub fn new(partials: Arc<dyn LayoutSource>, registry: Arc<RendererRegistry>) -> Self {
        Self { partials, registry }
    }
}

impl Helper for PartialHelper {
    fn call(&self, ctx: &RenderContext, args: &[&str]) -> Result<String, BoxError> {
        let (name, params) = args
            .split_first()
            .ok_or("partial helper expects a partial name")?;

        let mut data = Extensions::new();
        for param in params {
            let (key, value) = param
                .split_once('=')
                .ok_or_else(|| format!("partial argument \"{param}\" is not key=value"))?;
            data.insert_value(key, value);
        }

        let name = (*name).to_owned();
        let origin = ctx.path.clone();
        let partials = Arc::clone(&self.partials);
        let registry = Arc::clone(&self.registry);

        Ok(ctx.postprocess(move |final_ctx| async move {
            let file = partials
                .lookup(&name)
                .await
                .map_err(|source| RenderError::lookup("partial", &name, &origin, source))?;
            tracing::debug!(partial = %file.relative_path, file = %origin, "Rendering partial");

            let partial_ctx = final_ctx
                .with_extensions(&data)
                .with_content(file.contents.clone());
            let rendered = render_file(&registry, &file, partial_ctx).await?;
            Ok(rendered.context.content_str().into_owned())
        }))
    }
}
