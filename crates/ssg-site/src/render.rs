//! Chain rendering.
//!
//! [`ChainRenderer`] drives one content file through its layout chain: every
//! file of the chain is rendered by [`render_file`], innermost extension
//! first, with one [`RenderContext`] threaded from step to step. Deferred
//! post-process tokens are resolved once the outermost layout has run.

use std::sync::Arc;

use ssg_storage::{ContentFile, LayoutSource};

use crate::chain::{build_chain, merge_chain_meta};
use crate::context::{Extensions, RenderContext};
use crate::error::{MissingOutput, RenderError};
use crate::navigation::Navigation;
use crate::registry::RendererRegistry;
use crate::url::extension;

/// Final extensions a missing renderer is expected for.
const QUIET_EXTENSIONS: [&str; 3] = [".css", ".js", ".html"];

/// Output of rendering a single file's extensions.
#[derive(Debug)]
pub struct FileRender {
    /// Context carrying the rendered content.
    pub context: RenderContext,
    /// Relative path with every rendered extension but the last trimmed.
    pub relative_path: String,
}

/// Output of rendering a whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Final bytes after post-processing.
    pub contents: Vec<u8>,
    /// Output path of the content file.
    pub relative_path: String,
}

/// Apply the renderers for `file`'s extensions, right to left.
///
/// Rendering stops at the first extension without a renderer; that is logged
/// as a warning when more extensions remain (and the extension is not a final
/// format such as `.html`), and passes silently otherwise.
///
/// # Errors
///
/// Returns [`RenderError::Renderer`] when a renderer fails and
/// [`RenderError::InvalidRendererOutput`] when a callback renderer never
/// reports a result.
pub async fn render_file(
    registry: &RendererRegistry,
    file: &ContentFile,
    ctx: RenderContext,
) -> Result<FileRender, RenderError> {
    let mut ctx = ctx;
    let mut basename = file.basename().to_owned();
    let mut relative_path = file.relative_path.clone();

    while let Some(ext) = extension(&basename).map(str::to_owned) {
        basename.truncate(basename.len() - ext.len());
        let more = extension(&basename).is_some();

        let renderer = match registry.require(&ext, &file.relative_path) {
            Ok(renderer) => renderer,
            Err(RenderError::NoRenderer { .. }) => {
                if more && !QUIET_EXTENSIONS.contains(&ext.as_str()) {
                    tracing::warn!(
                        extension = %ext,
                        file = %file.relative_path,
                        "No renderer for extension"
                    );
                } else {
                    tracing::debug!(
                        extension = %ext,
                        file = %file.relative_path,
                        "No matching renderer"
                    );
                }
                break;
            }
            Err(err) => return Err(err),
        };

        tracing::debug!(extension = %ext, file = %file.relative_path, "Applying renderer");
        let content = renderer
            .render(&ctx, file)
            .await
            .map_err(|source| match source.downcast::<MissingOutput>() {
                Ok(missing) => RenderError::InvalidRendererOutput {
                    file: file.relative_path.clone(),
                    extension: ext.clone(),
                    reason: missing.to_string(),
                },
                Err(source) => RenderError::Renderer {
                    file: file.relative_path.clone(),
                    extension: ext.clone(),
                    source,
                },
            })?;

        if more {
            relative_path.truncate(relative_path.len() - ext.len());
        }
        ctx = ctx.with_content(content);
    }

    Ok(FileRender {
        context: ctx,
        relative_path,
    })
}

/// Renders content files through their layout chains.
///
/// # Example
///
/// ```ignore
/// let renderer = ChainRenderer::new(registry, layouts)
///     .with_extensions(Extensions::new().with_helper("partial", partials));
///
/// renderer.render(&mut file, navigation).await?;
/// std::fs::write(out_dir.join(&file.relative_path), &file.contents)?;
/// ```
#[derive(Clone)]
pub struct ChainRenderer {
    registry: Arc<RendererRegistry>,
    layouts: Arc<dyn LayoutSource>,
    extensions: Extensions,
}

impl ChainRenderer {
    /// Create a renderer over `registry`, resolving layouts from `layouts`.
    #[must_use]
    pub fn new(registry: Arc<RendererRegistry>, layouts: Arc<dyn LayoutSource>) -> Self {
        Self {
            registry,
            layouts,
            extensions: Extensions::new(),
        }
    }

    /// Set the extensions every render context starts with.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// The renderer registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<RendererRegistry> {
        &self.registry
    }

    /// Render `file` through its layout chain and write the result back.
    ///
    /// On success `file.contents` holds the final bytes and
    /// `file.relative_path` the output path; the bytes are also returned.
    /// On failure `file` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns any error of chain resolution, rendering or post-processing.
    pub async fn render(
        &self,
        file: &mut ContentFile,
        navigation: Option<Arc<Navigation>>,
    ) -> Result<Vec<u8>, RenderError> {
        let chain = build_chain(file, self.layouts.as_ref()).await?;
        let page = self.render_chain(&chain, navigation).await?;

        file.contents.clone_from(&page.contents);
        file.relative_path = page.relative_path;
        Ok(page.contents)
    }

    /// Render an already resolved chain.
    ///
    /// An empty chain renders to empty output.
    ///
    /// # Errors
    ///
    /// Returns any rendering or post-processing error. Errors from layouts
    /// are wrapped in [`RenderError::InLayout`].
    pub async fn render_chain(
        &self,
        chain: &[ContentFile],
        navigation: Option<Arc<Navigation>>,
    ) -> Result<RenderedPage, RenderError> {
        let Some(first) = chain.first() else {
            return Ok(RenderedPage {
                contents: Vec::new(),
                relative_path: String::new(),
            });
        };

        let mut ctx = RenderContext::new(first, navigation, self.extensions.clone());
        ctx.meta = merge_chain_meta(chain);
        let mut relative_path = first.relative_path.clone();

        for (position, file) in chain.iter().enumerate() {
            let step = render_file(&self.registry, file, ctx)
                .await
                .map_err(|err| in_layout(err, &first.relative_path, position))?;
            if position == 0 {
                relative_path = step.relative_path;
            }
            ctx = step.context;
        }

        let content = ctx.content.clone();
        let contents = ctx.resolve_post_process(content).await?;

        tracing::debug!(
            file = %first.relative_path,
            output = %relative_path,
            chain_len = chain.len(),
            "Rendered page"
        );
        Ok(RenderedPage {
            contents,
            relative_path,
        })
    }
}

fn in_layout(err: RenderError, origin: &str, position: usize) -> RenderError {
    if position == 0 {
        return err;
    }
    RenderError::InLayout {
        origin: origin.to_owned(),
        position,
        source: Box::new(err),
    }
}
