//! Layout chain resolution.
//!
//! Expands a content file into `[content, layout, layout-of-layout, ...]` by
//! following `layout` front-matter keys through a [`LayoutSource`].

use std::collections::HashSet;

use ssg_storage::{ContentFile, LayoutSource, Meta};

use crate::error::RenderError;

/// Resolve the layout chain of `file`.
///
/// The returned chain starts with a copy of `file`. Layout identity is the
/// storage path of the resolved file, so two names resolving to the same file
/// count as the same layout.
///
/// # Errors
///
/// Returns [`RenderError::RecursiveLayout`] when a layout is reached twice,
/// and [`RenderError::NotFound`] or [`RenderError::Lookup`] when a layout
/// cannot be resolved. All errors name `file` as their origin.
pub async fn build_chain(
    file: &ContentFile,
    layouts: &dyn LayoutSource,
) -> Result<Vec<ContentFile>, RenderError> {
    let mut seen = HashSet::from([file.source_path.clone()]);
    let mut chain = vec![file.clone()];
    let mut next = file.layout().map(str::to_owned);

    while let Some(name) = next {
        let layout = layouts
            .lookup(&name)
            .await
            .map_err(|source| RenderError::lookup("layout", &name, &file.relative_path, source))?;

        if !seen.insert(layout.source_path.clone()) {
            return Err(RenderError::RecursiveLayout {
                file: file.relative_path.clone(),
                layout: name,
                layout_path: layout.source_path,
            });
        }

        tracing::debug!(
            file = %file.relative_path,
            layout = %layout.relative_path,
            "Resolved layout"
        );
        next = layout.layout().map(str::to_owned);
        chain.push(layout);
    }

    Ok(chain)
}

/// Merge chain metadata so files nearer the content win.
///
/// The outermost layout is the base; each file closer to the content file
/// overrides it key by key.
#[must_use]
pub fn merge_chain_meta(chain: &[ContentFile]) -> Meta {
    chain.iter().rev().fold(Meta::new(), |mut merged, file| {
        for (key, value) in &file.meta {
            merged.insert(key.clone(), value.clone());
        }
        merged
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use ssg_storage::MockLayoutSource;

    use super::*;
    use crate::error::RenderErrorKind;

    fn content(text: &str) -> ContentFile {
        ContentFile::from_bytes("page.html", "/src/page.html", text.as_bytes()).unwrap()
    }

    fn paths(chain: &[ContentFile]) -> Vec<&str> {
        chain.iter().map(|f| f.relative_path.as_str()).collect()
    }

    #[tokio::test]
    async fn test_chain_order() {
        let layouts = MockLayoutSource::new()
            .with_layout("b", "b.tmpl", "---\nlayout: c\n---\nB")
            .with_layout("c", "c.tmpl", "C");
        let file = content("---\nlayout: b\n---\nA");

        let chain = build_chain(&file, &layouts).await.unwrap();

        assert_eq!(paths(&chain), vec!["page.html", "b.tmpl", "c.tmpl"]);
        assert_eq!(layouts.lookups(), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_chain_without_layout() {
        let layouts = MockLayoutSource::new();
        let file = content("plain");

        let chain = build_chain(&file, &layouts).await.unwrap();

        assert_eq!(chain, vec![file]);
        assert!(layouts.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_chain_detects_cycle() {
        let layouts = MockLayoutSource::new()
            .with_layout("b", "b.tmpl", "---\nlayout: a\n---\nB")
            .with_layout("a", "a.tmpl", "---\nlayout: b\n---\nA");
        let file = content("---\nlayout: a\n---\nPage");

        let err = build_chain(&file, &layouts).await.unwrap_err();

        assert_eq!(err.kind(), RenderErrorKind::RecursiveReference);
        let RenderError::RecursiveLayout { file, layout, .. } = err else {
            panic!("expected recursive layout error");
        };
        assert_eq!(file, "page.html");
        assert_eq!(layout, "a");
        assert_eq!(layouts.lookups(), vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn test_chain_detects_self_reference() {
        let layouts =
            MockLayoutSource::new().with_layout("loop", "loop.tmpl", "---\nlayout: loop\n---\n");
        let file = content("---\nlayout: loop\n---\nPage");

        let err = build_chain(&file, &layouts).await.unwrap_err();

        assert_eq!(err.kind(), RenderErrorKind::RecursiveReference);
    }

    #[tokio::test]
    async fn test_chain_missing_layout() {
        let layouts = MockLayoutSource::new();
        let file = content("---\nlayout: nope\n---\nPage");

        let err = build_chain(&file, &layouts).await.unwrap_err();

        assert_eq!(err.kind(), RenderErrorKind::NotFound);
        assert!(err.to_string().contains("\"nope\" layout for page.html"));
    }

    #[test]
    fn test_merge_chain_meta_precedence() {
        let chain = vec![
            content("---\ntitle: x\nlayout: b\n---\n"),
            ContentFile::from_bytes(
                "b.tmpl",
                "/l/b.tmpl",
                b"---\ntitle: y\ntheme: z\nlayout: c\n---\n",
            )
            .unwrap(),
            ContentFile::from_bytes("c.tmpl", "/l/c.tmpl", b"---\ntheme: outer\nlang: en\n---\n")
                .unwrap(),
        ];

        let meta = merge_chain_meta(&chain);

        assert_eq!(meta.get("title"), Some(&json!("x")));
        assert_eq!(meta.get("theme"), Some(&json!("z")));
        assert_eq!(meta.get("lang"), Some(&json!("en")));
        assert_eq!(meta.get("layout"), Some(&json!("b")));
    }
}
