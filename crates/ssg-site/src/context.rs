//! Rendering context.
//!
//! A [`RenderContext`] carries everything a renderer may read while turning
//! one file of a layout chain into bytes: the page's own front matter, the
//! merged chain metadata, the content produced by the previous step, the page
//! URL, its navigation view and caller-supplied [`Extensions`].
//!
//! Contexts are cheap to clone. All clones made during one page render share
//! the same post-process queue, so a token registered from a nested helper is
//! resolved with the rest of the page.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use ssg_storage::{ContentFile, Meta};

use crate::error::{BoxError, RenderError};
use crate::navigation::Navigation;
use crate::postprocess::PostProcessQueue;
use crate::url::make_url;

/// A named function templates can call, e.g. `{{ partial "footer" }}`.
pub trait Helper: Send + Sync {
    /// Produce the text that replaces the call site.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are unusable.
    fn call(&self, ctx: &RenderContext, args: &[&str]) -> Result<String, BoxError>;
}

/// [`Helper`] backed by a closure.
pub struct FnHelper<F>(F);

impl<F> Helper for FnHelper<F>
where
    F: Fn(&RenderContext, &[&str]) -> Result<String, BoxError> + Send + Sync,
{
    fn call(&self, ctx: &RenderContext, args: &[&str]) -> Result<String, BoxError> {
        (self.0)(ctx, args)
    }
}

/// Wrap a closure as a shared [`Helper`].
pub fn helper_fn<F>(f: F) -> Arc<dyn Helper>
where
    F: Fn(&RenderContext, &[&str]) -> Result<String, BoxError> + Send + Sync + 'static,
{
    Arc::new(FnHelper(f))
}

/// Caller-supplied values and helpers visible to every renderer.
#[derive(Clone, Default)]
pub struct Extensions {
    values: Meta,
    helpers: HashMap<String, Arc<dyn Helper>>,
}

impl Extensions {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_value(key, value);
        self
    }

    /// Add a helper.
    #[must_use]
    pub fn with_helper(mut self, name: impl Into<String>, helper: Arc<dyn Helper>) -> Self {
        self.insert_helper(name, helper);
        self
    }

    /// Insert or replace a value.
    pub fn insert_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Insert or replace a helper.
    pub fn insert_helper(&mut self, name: impl Into<String>, helper: Arc<dyn Helper>) {
        self.helpers.insert(name.into(), helper);
    }

    /// Look up a value.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All values.
    #[must_use]
    pub fn values(&self) -> &Meta {
        &self.values
    }

    /// Look up a helper.
    #[must_use]
    pub fn helper(&self, name: &str) -> Option<&Arc<dyn Helper>> {
        self.helpers.get(name)
    }

    /// Copy every entry of `other` into `self`, replacing on conflict.
    pub fn merge(&mut self, other: &Extensions) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        for (name, helper) in &other.helpers {
            self.helpers.insert(name.clone(), Arc::clone(helper));
        }
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut helpers: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        helpers.sort_unstable();
        f.debug_struct("Extensions")
            .field("values", &self.values)
            .field("helpers", &helpers)
            .finish()
    }
}

/// State handed to each renderer in a chain.
#[derive(Clone)]
pub struct RenderContext {
    /// Front matter of the content file at the head of the chain.
    pub document: Meta,
    /// Chain metadata merged outermost layout first, content file last.
    pub meta: Meta,
    /// Per-page navigation view.
    pub navigation: Option<Arc<Navigation>>,
    /// Output of the previous rendering step.
    pub content: Vec<u8>,
    /// Page URL.
    pub url: String,
    /// Relative path of the content file.
    pub path: String,
    /// Storage path of the content file.
    pub absolute_path: PathBuf,
    /// Caller-supplied values and helpers.
    pub extensions: Extensions,
    post_process: Arc<PostProcessQueue>,
}

impl RenderContext {
    /// Start a render pass for `file` with a fresh post-process queue.
    ///
    /// `meta` starts as the file's own front matter.
    #[must_use]
    pub fn new(
        file: &ContentFile,
        navigation: Option<Arc<Navigation>>,
        extensions: Extensions,
    ) -> Self {
        let url = file
            .url
            .clone()
            .unwrap_or_else(|| make_url(&file.relative_path, &[], None));
        Self {
            document: file.meta.clone(),
            meta: file.meta.clone(),
            navigation,
            content: file.contents.clone(),
            url,
            path: file.relative_path.clone(),
            absolute_path: file.source_path.clone(),
            extensions,
            post_process: Arc::new(PostProcessQueue::default()),
        }
    }

    /// Clone with different content, sharing the post-process queue.
    #[must_use]
    pub fn with_content(&self, content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    /// Clone with `addon` merged over the extensions, sharing the queue.
    #[must_use]
    pub fn with_extensions(&self, addon: &Extensions) -> Self {
        let mut ctx = self.clone();
        ctx.extensions.merge(addon);
        ctx
    }

    /// Content as text, replacing invalid UTF-8.
    #[must_use]
    pub fn content_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Call a helper from the extensions by name.
    ///
    /// # Errors
    ///
    /// Returns an error if no helper is registered under `name` or the helper
    /// itself fails.
    pub fn call_helper(&self, name: &str, args: &[&str]) -> Result<String, BoxError> {
        let helper = self
            .extensions
            .helper(name)
            .ok_or_else(|| format!("unknown helper \"{name}\""))?;
        helper.call(self, args)
    }

    /// Defer work until every renderer of the chain has run.
    ///
    /// Returns a token to embed in the output. Once the chain completes, the
    /// first occurrence of the token is replaced with the thunk's result. The
    /// thunk receives the final context of the pass; it may register further
    /// tokens, which are resolved in the same pass.
    pub fn postprocess<F, Fut>(&self, thunk: F) -> String
    where
        F: FnOnce(RenderContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, RenderError>> + Send + 'static,
    {
        self.post_process.register(Box::new(move |ctx| thunk(ctx).boxed()))
    }

    /// Replace every registered token in `content`.
    pub(crate) async fn resolve_post_process(
        &self,
        content: Vec<u8>,
    ) -> Result<Vec<u8>, RenderError> {
        self.post_process.resolve(self, content).await
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("url", &self.url)
            .field("path", &self.path)
            .field("meta", &self.meta)
            .field("content_len", &self.content.len())
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_render_context_is_send_sync() {
        assert_send_sync::<RenderContext>();
        assert_send_sync::<Extensions>();
    }

    #[test]
    fn test_new_copies_file_fields() {
        let mut meta = Meta::new();
        meta.insert("title".to_owned(), json!("Guide"));
        let file = ContentFile::new("docs/guide.html", "/site/docs/guide.html", "<p/>")
            .with_meta(meta.clone());

        let ctx = RenderContext::new(&file, None, Extensions::new());

        assert_eq!(ctx.document, meta);
        assert_eq!(ctx.meta, meta);
        assert_eq!(ctx.content, b"<p/>");
        assert_eq!(ctx.url, "/docs/guide.html");
        assert_eq!(ctx.path, "docs/guide.html");
        assert_eq!(ctx.absolute_path, PathBuf::from("/site/docs/guide.html"));
    }

    #[test]
    fn test_new_prefers_scaffolded_url() {
        let mut file = ContentFile::new("docs/index.html", "/site/docs/index.html", "");
        file.url = Some("/docs/".to_owned());

        let ctx = RenderContext::new(&file, None, Extensions::new());

        assert_eq!(ctx.url, "/docs/");
    }

    #[test]
    fn test_with_content_shares_queue() {
        let file = ContentFile::new("a.html", "/a.html", "");
        let ctx = RenderContext::new(&file, None, Extensions::new());
        let other = ctx.with_content("next");

        let first = ctx.postprocess(|_| async { Ok(String::new()) });
        let second = other.postprocess(|_| async { Ok(String::new()) });

        assert_eq!(other.content, b"next");
        assert_ne!(first, second);
        assert!(Arc::ptr_eq(&ctx.post_process, &other.post_process));
    }

    #[test]
    fn test_with_extensions_merges() {
        let file = ContentFile::new("a.html", "/a.html", "");
        let base = Extensions::new()
            .with_value("site", "Docs")
            .with_value("year", 2024);
        let ctx = RenderContext::new(&file, None, base);

        let merged = ctx.with_extensions(&Extensions::new().with_value("year", 2025));

        assert_eq!(merged.extensions.value("site"), Some(&json!("Docs")));
        assert_eq!(merged.extensions.value("year"), Some(&json!(2025)));
        assert_eq!(ctx.extensions.value("year"), Some(&json!(2024)));
    }

    #[test]
    fn test_call_helper() {
        let file = ContentFile::new("a.html", "/a.html", "");
        let shout = helper_fn(|_, args| Ok(args.join(" ").to_uppercase()));
        let ctx = RenderContext::new(&file, None, Extensions::new().with_helper("shout", shout));

        assert_eq!(ctx.call_helper("shout", &["hi", "there"]).unwrap(), "HI THERE");

        let err = ctx.call_helper("whisper", &[]).unwrap_err();
        assert_eq!(err.to_string(), "unknown helper \"whisper\"");
    }
}
