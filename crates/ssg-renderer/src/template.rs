//! Placeholder templates.
//!
//! Templates are plain text with `{{ ... }}` tags:
//!
//! | Tag                   | Output                                   |
//! |-----------------------|------------------------------------------|
//! | `{{ content }}`       | output of the previous step, raw         |
//! | `{{ navigation }}`    | page navigation as nested `<ul>`, raw    |
//! | `{{ url }}`           | page URL                                 |
//! | `{{ path }}`          | relative path of the content file        |
//! | `{{ meta.KEY }}`      | merged chain metadata                    |
//! | `{{ document.KEY }}`  | front matter of the content file         |
//! | `{{ ext.KEY }}`       | caller-supplied extension value          |
//! | `{{ NAME args... }}`  | helper call (`{{ partial footer }}`), raw|
//!
//! Values other than `content`, `navigation` and helper output are
//! HTML-escaped. Keys may be dotted to reach nested values; a missing key
//! renders as nothing.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::Arc;

use serde_json::Value;
use ssg_site::{BoxError, NavItem, Navigation, RenderContext, Renderer, Selection, renderer_fn};

/// Error produced while expanding a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// `{{` without a closing `}}`.
    #[error("unterminated tag at byte {offset}")]
    Unterminated { offset: usize },

    /// `{{ }}` with nothing inside.
    #[error("empty tag at byte {offset}")]
    EmptyTag { offset: usize },

    /// Quoted argument without a closing quote.
    #[error("unterminated quote in tag \"{tag}\"")]
    UnterminatedQuote { tag: String },

    /// Tag names neither a variable nor a registered helper.
    #[error("unknown name \"{name}\" in template")]
    UnknownName { name: String },

    /// A helper returned an error.
    #[error("helper \"{name}\" failed: {source}")]
    Helper {
        name: String,
        #[source]
        source: BoxError,
    },
}

/// Renderer expanding the file's own body as a template.
///
/// The body comes from the chain member being rendered, not from the previous
/// step, which is available as `{{ content }}`.
#[must_use]
pub fn template() -> Arc<dyn Renderer> {
    renderer_fn(|ctx, file| {
        let source = String::from_utf8_lossy(&file.contents);
        Ok(render_template(&source, ctx)?.into_bytes())
    })
}

/// Expand every tag of `source` against `ctx`.
pub fn render_template(source: &str, ctx: &RenderContext) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        let offset = source.len() - rest.len() + start;
        output.push_str(&rest[..start]);

        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(TemplateError::Unterminated { offset })?;
        let tag = after[..end].trim();
        if tag.is_empty() {
            return Err(TemplateError::EmptyTag { offset });
        }

        output.push_str(&expand(tag, ctx)?);
        rest = &after[end + 2..];
    }

    output.push_str(rest);
    Ok(output)
}

fn expand<'a>(tag: &str, ctx: &'a RenderContext) -> Result<Cow<'a, str>, TemplateError> {
    let args = split_args(tag)?;
    let Some((name, params)) = args.split_first() else {
        return Err(TemplateError::UnknownName { name: tag.to_owned() });
    };
    let name = *name;

    if params.is_empty() {
        match name {
            "content" => return Ok(ctx.content_str()),
            "navigation" => {
                return Ok(ctx
                    .navigation
                    .as_deref()
                    .map_or(Cow::Borrowed(""), |nav| Cow::Owned(navigation_html(nav))));
            }
            "url" => return Ok(Cow::Owned(escape_html(&ctx.url))),
            "path" => return Ok(Cow::Owned(escape_html(&ctx.path))),
            _ => {}
        }

        if let Some((scope, key)) = name.split_once('.') {
            let root = match scope {
                "meta" => Some(ctx.meta.get(head(key))),
                "document" => Some(ctx.document.get(head(key))),
                "ext" => Some(ctx.extensions.value(head(key))),
                _ => None,
            };
            if let Some(root) = root {
                let value = root.and_then(|value| descend(value, key));
                return Ok(Cow::Owned(escape_html(&display_value(value))));
            }
        }
    }

    if ctx.extensions.helper(name).is_none() {
        return Err(TemplateError::UnknownName { name: name.to_owned() });
    }
    tracing::debug!(helper = name, file = %ctx.path, "Calling template helper");
    ctx.call_helper(name, params)
        .map(Cow::Owned)
        .map_err(|source| TemplateError::Helper {
            name: name.to_owned(),
            source,
        })
}

/// Split a tag into whitespace-separated words; `"..."` groups a word.
fn split_args(tag: &str) -> Result<Vec<&str>, TemplateError> {
    let mut args = Vec::new();
    let mut rest = tag.trim_start();

    while !rest.is_empty() {
        if let Some(quoted) = rest.strip_prefix('"') {
            let end = quoted
                .find('"')
                .ok_or_else(|| TemplateError::UnterminatedQuote { tag: tag.to_owned() })?;
            args.push(&quoted[..end]);
            rest = quoted[end + 1..].trim_start();
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            args.push(&rest[..end]);
            rest = rest[end..].trim_start();
        }
    }

    Ok(args)
}

fn head(key: &str) -> &str {
    key.split_once('.').map_or(key, |(first, _)| first)
}

/// Follow the dotted remainder of `key` below `value`.
fn descend<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    let Some((_, rest)) = key.split_once('.') else {
        return Some(value);
    };
    rest.split('.').try_fold(value, |current, part| match current {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render a navigation view as nested lists.
///
/// Selected items carry `class="current"` or `class="parent"`. Items without a
/// title are labelled with their URL.
#[must_use]
pub fn navigation_html(navigation: &Navigation) -> String {
    let mut html = String::from("<ul>");
    push_item(&mut html, navigation.root());
    html.push_str("</ul>");
    html
}

fn push_item(html: &mut String, item: NavItem<'_>) {
    match item.selected() {
        Some(Selection::Current) => html.push_str(r#"<li class="current">"#),
        Some(Selection::Parent) => html.push_str(r#"<li class="parent">"#),
        None => html.push_str("<li>"),
    }
    let _ = write!(
        html,
        r#"<a href="{}">{}</a>"#,
        escape_html(item.url()),
        escape_html(item.title().unwrap_or(item.url()))
    );
    if item.has_children() {
        html.push_str("<ul>");
        for child in item.children() {
            push_item(html, child);
        }
        html.push_str("</ul>");
    }
    html.push_str("</li>");
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
