//! Renderer trait and extension registry.
//!
//! A [`Renderer`] turns the current content of a [`RenderContext`] into new
//! bytes. Renderers are registered per file extension in a
//! [`RendererRegistry`]; rendering a file applies the renderers for its
//! extensions from right to left.
//!
//! Three adapters cover the usual shapes of a renderer:
//!
//! - [`renderer_fn`] for synchronous functions
//! - [`async_renderer`] for functions returning a future
//! - [`callback_renderer`] for code that reports through a [`Completion`]
//!   handle, possibly from another thread

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use ssg_storage::ContentFile;

use crate::context::RenderContext;
use crate::error::{BoxError, MissingOutput, RenderError};
use crate::url::{NameResolver, extension};

/// Result of a single renderer invocation.
pub type RenderOutput = Result<Vec<u8>, BoxError>;

/// Transforms content for one file extension.
pub trait Renderer: Send + Sync {
    /// Render `ctx.content` for `file`.
    ///
    /// `file` is the chain member being rendered; its `contents` are the raw
    /// template body, while `ctx.content` holds the output of the previous step.
    fn render<'a>(
        &'a self,
        ctx: &'a RenderContext,
        file: &'a ContentFile,
    ) -> BoxFuture<'a, RenderOutput>;
}

/// [`Renderer`] backed by a synchronous function.
pub struct FnRenderer<F>(F);

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&RenderContext, &ContentFile) -> RenderOutput + Send + Sync,
{
    fn render<'a>(
        &'a self,
        ctx: &'a RenderContext,
        file: &'a ContentFile,
    ) -> BoxFuture<'a, RenderOutput> {
        futures::future::ready((self.0)(ctx, file)).boxed()
    }
}

/// Wrap a synchronous function as a shared renderer.
pub fn renderer_fn<F>(f: F) -> Arc<dyn Renderer>
where
    F: Fn(&RenderContext, &ContentFile) -> RenderOutput + Send + Sync + 'static,
{
    Arc::new(FnRenderer(f))
}

/// [`Renderer`] backed by a function returning a future.
pub struct AsyncFnRenderer<F>(F);

impl<F, Fut> Renderer for AsyncFnRenderer<F>
where
    F: Fn(RenderContext, ContentFile) -> Fut + Send + Sync,
    Fut: Future<Output = RenderOutput> + Send + 'static,
{
    fn render<'a>(
        &'a self,
        ctx: &'a RenderContext,
        file: &'a ContentFile,
    ) -> BoxFuture<'a, RenderOutput> {
        (self.0)(ctx.clone(), file.clone()).boxed()
    }
}

/// Wrap an async function as a shared renderer.
pub fn async_renderer<F, Fut>(f: F) -> Arc<dyn Renderer>
where
    F: Fn(RenderContext, ContentFile) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RenderOutput> + Send + 'static,
{
    Arc::new(AsyncFnRenderer(f))
}

/// One-shot handle a callback-style renderer reports its result through.
///
/// Dropping the handle without calling [`Completion::done`] fails the render
/// with an invalid-output error.
pub struct Completion(oneshot::Sender<RenderOutput>);

impl Completion {
    /// Report the result.
    pub fn done(self, output: RenderOutput) {
        // The receiver only goes away if the render itself was dropped
        let _ = self.0.send(output);
    }

    /// Report success.
    pub fn ok(self, content: impl Into<Vec<u8>>) {
        self.done(Ok(content.into()));
    }

    /// Report failure.
    pub fn fail(self, err: impl Into<BoxError>) {
        self.done(Err(err.into()));
    }
}

/// [`Renderer`] backed by a callback receiving a [`Completion`].
pub struct CallbackRenderer<F>(F);

impl<F> Renderer for CallbackRenderer<F>
where
    F: Fn(&RenderContext, &ContentFile, Completion) + Send + Sync,
{
    fn render<'a>(
        &'a self,
        ctx: &'a RenderContext,
        file: &'a ContentFile,
    ) -> BoxFuture<'a, RenderOutput> {
        let (tx, rx) = oneshot::channel();
        (self.0)(ctx, file, Completion(tx));
        async move {
            match rx.await {
                Ok(output) => output,
                Err(oneshot::Canceled) => Err(Box::new(MissingOutput) as BoxError),
            }
        }
        .boxed()
    }
}

/// Wrap a callback-style function as a shared renderer.
pub fn callback_renderer<F>(f: F) -> Arc<dyn Renderer>
where
    F: Fn(&RenderContext, &ContentFile, Completion) + Send + Sync + 'static,
{
    Arc::new(CallbackRenderer(f))
}

/// Renderers keyed by extension (without the leading dot).
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: HashMap<String, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `renderer` for each extension in `extensions`.
    ///
    /// `extensions` is a list separated by `,` or `|` (`"md,markdown"`);
    /// leading dots are ignored. A later registration replaces an earlier one.
    pub fn register(&mut self, extensions: &str, renderer: Arc<dyn Renderer>) -> &mut Self {
        for name in extensions
            .split([',', '|'])
            .map(|s| s.trim().trim_start_matches('.'))
            .filter(|s| !s.is_empty())
        {
            self.renderers.insert(name.to_owned(), Arc::clone(&renderer));
        }
        self
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, extensions: &str, renderer: Arc<dyn Renderer>) -> Self {
        self.register(extensions, renderer);
        self
    }

    /// New registry with `overrides` layered on top of `self`.
    #[must_use]
    pub fn overlay(&self, overrides: &RendererRegistry) -> Self {
        let mut merged = self.clone();
        for (name, renderer) in &overrides.renderers {
            merged.renderers.insert(name.clone(), Arc::clone(renderer));
        }
        merged
    }

    /// Renderer for `extension` (with or without the leading dot).
    #[must_use]
    pub fn get(&self, extension: &str) -> Option<&Arc<dyn Renderer>> {
        self.renderers.get(extension.trim_start_matches('.'))
    }

    /// Renderer for `extension`, or [`RenderError::NoRenderer`] for `file`.
    pub fn require(&self, extension: &str, file: &str) -> Result<&Arc<dyn Renderer>, RenderError> {
        self.get(extension).ok_or_else(|| RenderError::NoRenderer {
            extension: extension.to_owned(),
            file: file.to_owned(),
        })
    }

    /// Whether a renderer is registered for `extension`.
    #[must_use]
    pub fn contains(&self, extension: &str) -> bool {
        self.get(extension).is_some()
    }

    /// Registered extensions, sorted.
    #[must_use]
    pub fn extensions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Name resolver stripping trailing registered extensions.
    ///
    /// The last remaining extension is always kept: `page.html.tmpl` resolves
    /// to `page.html`, `guide.md` stays `guide.md`.
    #[must_use]
    pub fn name_resolver(&self) -> Arc<NameResolver> {
        let known: HashSet<String> = self.renderers.keys().cloned().collect();
        Arc::new(move |path: &str| strip_render_extensions(path, &known))
    }
}

fn strip_render_extensions(path: &str, known: &HashSet<String>) -> String {
    let slash = path.rfind('/').map_or(0, |i| i + 1);
    let mut end = path.len();
    while let Some(ext) = extension(&path[slash..end]) {
        let stem_end = end - ext.len();
        if !known.contains(&ext[1..]) || extension(&path[slash..stem_end]).is_none() {
            break;
        }
        end = stem_end;
    }
    path[..end].to_owned()
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::Extensions;

    fn assert_send_sync<T: Send + Sync>() {}

    fn context(content: &str) -> (RenderContext, ContentFile) {
        let file = ContentFile::new("page.html.x", "/src/page.html.x", content);
        let ctx = RenderContext::new(&file, None, Extensions::new());
        (ctx, file)
    }

    fn upper() -> Arc<dyn Renderer> {
        renderer_fn(|ctx, _| Ok(ctx.content_str().to_uppercase().into_bytes()))
    }

    #[test]
    fn test_registry_is_send_sync() {
        assert_send_sync::<RendererRegistry>();
    }

    #[test]
    fn test_register_splits_extension_list() {
        let mut registry = RendererRegistry::new();
        registry.register("md, .markdown|mdown", upper());

        assert_eq!(registry.extensions(), vec!["markdown", "md", "mdown"]);
        assert!(registry.contains(".md"));
        assert!(registry.get("txt").is_none());
    }

    #[test]
    fn test_require_missing_is_no_renderer() {
        let registry = RendererRegistry::new();
        let err = registry.require(".eco", "page.html.eco").err().unwrap();

        assert_eq!(err.kind(), crate::RenderErrorKind::NoRenderer);
    }

    #[tokio::test]
    async fn test_overlay_prefers_overrides() {
        let base = RendererRegistry::new()
            .with("x", upper())
            .with("y", upper());
        let overrides =
            RendererRegistry::new().with("x", renderer_fn(|_, _| Ok(b"override".to_vec())));

        let merged = base.overlay(&overrides);
        let (ctx, file) = context("abc");

        assert_eq!(merged.get("x").unwrap().render(&ctx, &file).await.unwrap(), b"override");
        assert_eq!(merged.get("y").unwrap().render(&ctx, &file).await.unwrap(), b"ABC");
        assert_eq!(base.get("x").unwrap().render(&ctx, &file).await.unwrap(), b"ABC");
    }

    #[tokio::test]
    async fn test_async_renderer() {
        let renderer = async_renderer(|ctx: RenderContext, file: ContentFile| async move {
            Ok(format!("{}:{}", file.relative_path, ctx.content_str()).into_bytes())
        });
        let (ctx, file) = context("body");

        let output = renderer.render(&ctx, &file).await.unwrap();

        assert_eq!(output, b"page.html.x:body");
    }

    #[tokio::test]
    async fn test_callback_renderer_from_thread() {
        let renderer = callback_renderer(|ctx, _, done| {
            let mut content = ctx.content.clone();
            thread::spawn(move || {
                content.push(b'!');
                done.ok(content);
            });
        });
        let (ctx, file) = context("hey");

        let output = renderer.render(&ctx, &file).await.unwrap();

        assert_eq!(output, b"hey!");
    }

    #[tokio::test]
    async fn test_callback_renderer_reports_failure() {
        let renderer = callback_renderer(|_, _, done| done.fail("broken template"));
        let (ctx, file) = context("");

        let err = renderer.render(&ctx, &file).await.unwrap_err();

        assert_eq!(err.to_string(), "broken template");
    }

    #[tokio::test]
    async fn test_callback_renderer_dropped_completion() {
        let renderer = callback_renderer(|_, _, done| drop(done));
        let (ctx, file) = context("");

        let err = renderer.render(&ctx, &file).await.unwrap_err();

        assert!(err.downcast_ref::<MissingOutput>().is_some());
    }

    #[test]
    fn test_name_resolver_strips_registered_extensions() {
        let registry = RendererRegistry::new()
            .with("md", upper())
            .with("tmpl", upper());
        let resolve = registry.name_resolver();

        assert_eq!(resolve("/blog/page.html.tmpl"), "/blog/page.html");
        assert_eq!(resolve("/blog/page.html.md.tmpl"), "/blog/page.html");
        assert_eq!(resolve("/guide.md"), "/guide.md");
        assert_eq!(resolve("/notes.txt.eco"), "/notes.txt.eco");
        assert_eq!(resolve("/v1.2/readme"), "/v1.2/readme");
        assert_eq!(resolve("/.tmpl"), "/.tmpl");
    }
}
