//! URL normalization.
//!
//! Turns a content-relative path into the canonical site URL used for
//! navigation matching: leading slash, forward slashes only, and index files
//! collapsed onto their directory (`about/index.html` becomes `/about/`).

use std::sync::LazyLock;

use regex::Regex;

/// Maps a URL (or path) to the name it should be published under.
///
/// [`RendererRegistry::name_resolver`](crate::RendererRegistry::name_resolver)
/// builds one that strips renderer extensions, so `page.html.tmpl` resolves to
/// `page.html`.
pub type NameResolver = dyn Fn(&str) -> String + Send + Sync;

static DEFAULT_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^index\.\w+").expect("default index pattern is valid"));

/// A rule deciding whether a file name denotes a directory index.
#[derive(Clone, Debug)]
pub enum IndexPattern {
    /// Basename must equal the string.
    Exact(String),
    /// Basename must match the regex.
    Regex(Regex),
}

impl IndexPattern {
    /// Build a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Regex)
    }

    /// Build an exact-name pattern.
    #[must_use]
    pub fn exact(name: impl Into<String>) -> Self {
        Self::Exact(name.into())
    }

    /// Patterns used when none are configured: `^index\.\w+`.
    #[must_use]
    pub fn default_patterns() -> Vec<Self> {
        vec![Self::Regex(DEFAULT_INDEX.clone())]
    }

    /// Whether `basename` is an index file name.
    #[must_use]
    pub fn matches(&self, basename: &str) -> bool {
        match self {
            Self::Exact(name) => name == basename,
            Self::Regex(regex) => regex.is_match(basename),
        }
    }
}

/// Compute the canonical URL for `path`.
///
/// Back-slashes become forward slashes, a leading `/` is added, the optional
/// `name_resolver` is applied, and when the basename matches any of
/// `index_patterns` the basename is dropped, leaving the directory URL with a
/// trailing slash.
///
/// Idempotent for paths whose result is not itself an index file name.
#[must_use]
pub fn make_url(
    path: &str,
    index_patterns: &[IndexPattern],
    name_resolver: Option<&NameResolver>,
) -> String {
    let mut url = path.replace('\\', "/");
    if !url.starts_with('/') {
        url.insert(0, '/');
    }
    if let Some(resolve) = name_resolver {
        url = resolve(&url);
    }

    let slash = url.rfind('/').unwrap_or(0);
    let basename = &url[slash + 1..];
    if !basename.is_empty() && index_patterns.iter().any(|p| p.matches(basename)) {
        url.truncate(slash + 1);
    }
    url
}

/// Extension of `name` including the leading dot.
///
/// Dot-files such as `.eco` have no extension, matching how the renderer
/// walks extensions right to left.
pub(crate) fn extension(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(&name[dot..]),
    }
}
