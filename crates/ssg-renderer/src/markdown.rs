//! Markdown renderer.

use std::sync::Arc;

use pulldown_cmark::{Options, Parser, html};
use ssg_site::{Renderer, renderer_fn};

/// Parser options used by [`markdown`].
#[must_use]
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render markdown text to HTML.
#[must_use]
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// Renderer turning the current content into HTML.
///
/// Works on `ctx.content` rather than the file's raw body, so it composes with
/// renderers applied before it (`page.html.md.tmpl`).
#[must_use]
pub fn markdown() -> Arc<dyn Renderer> {
    renderer_fn(|ctx, _file| Ok(render_markdown(&ctx.content_str()).into_bytes()))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ssg_site::{Extensions, RenderContext};
    use ssg_storage::ContentFile;

    use super::*;

    #[test]
    fn test_render_markdown_basic() {
        assert_eq!(
            render_markdown("# Title\n\nSome *text*."),
            "<h1>Title</h1>\n<p>Some <em>text</em>.</p>\n"
        );
    }

    #[test]
    fn test_render_markdown_gfm_extensions() {
        let output = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~\n\n- [x] done\n");

        assert!(output.contains("<table>"));
        assert!(output.contains("<del>old</del>"));
        assert!(output.contains(r#"type="checkbox""#));
        assert!(output.contains("checked"));
    }

    #[test]
    fn test_render_markdown_footnotes() {
        let output = render_markdown("Text[^1]\n\n[^1]: Note\n");

        assert!(output.contains("footnote-reference"));
        assert!(output.contains("footnote-definition"));
    }

    #[tokio::test]
    async fn test_markdown_renders_context_content() {
        let file = ContentFile::new("page.html.md", "/src/page.html.md", "*raw*");
        let ctx = RenderContext::new(&file, None, Extensions::new()).with_content("**previous**");

        let output = markdown().render(&ctx, &file).await.unwrap();

        assert_eq!(output, b"<p><strong>previous</strong></p>\n");
    }
}
