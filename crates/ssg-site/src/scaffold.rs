//! Page scaffolding.
//!
//! Assigns URLs to page files and builds the site navigation with one view
//! per page, ready to hand to the [`ChainRenderer`](crate::ChainRenderer).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use ssg_storage::ContentFile;

use crate::navigation::{NavOptions, Navigation};
use crate::registry::RendererRegistry;
use crate::url::make_url;

static DEFAULT_PAGES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.html?\b").expect("default pages pattern is valid"));

/// Which files are pages and how their URLs are computed.
#[derive(Clone, Debug)]
pub struct ScaffoldOptions {
    /// Files whose relative path matches are pages.
    pub pages: Regex,
    /// Navigation options (index patterns and name resolver).
    pub navigation: NavOptions,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            pages: DEFAULT_PAGES.clone(),
            navigation: NavOptions::default(),
        }
    }
}

impl ScaffoldOptions {
    /// Default options with the name resolver of `registry`.
    #[must_use]
    pub fn for_registry(registry: &RendererRegistry) -> Self {
        Self {
            navigation: NavOptions::default().with_name_resolver(registry.name_resolver()),
            ..Self::default()
        }
    }

    /// Replace the pages pattern.
    #[must_use]
    pub fn with_pages(mut self, pages: Regex) -> Self {
        self.pages = pages;
        self
    }

    /// Replace the navigation options, keeping nothing from the old ones.
    #[must_use]
    pub fn with_navigation(mut self, navigation: NavOptions) -> Self {
        self.navigation = navigation;
        self
    }

    /// Whether `file` is a page.
    #[must_use]
    pub fn is_page(&self, file: &ContentFile) -> bool {
        self.pages.is_match(&file.relative_path)
    }
}

/// Site navigation plus one view per page.
#[derive(Debug)]
pub struct Scaffold {
    /// Canonical navigation tree.
    pub navigation: Arc<Navigation>,
    views: HashMap<usize, Arc<Navigation>>,
}

impl Scaffold {
    /// Navigation view for the file at `index` of the scaffolded slice.
    ///
    /// `None` for files that are not pages.
    #[must_use]
    pub fn view(&self, index: usize) -> Option<Arc<Navigation>> {
        self.views.get(&index).map(Arc::clone)
    }

    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.views.len()
    }
}

/// Assign URLs to the pages among `files` and build their navigation views.
///
/// Every page gets `url` set from its relative path through the name resolver
/// and index patterns, so `blog/index.html.md` becomes `/blog/`. Non-page
/// files are left untouched.
pub fn scaffold(files: &mut [ContentFile], options: &ScaffoldOptions) -> Scaffold {
    let nav_options = &options.navigation;
    let mut pages = Vec::new();
    for (index, file) in files.iter_mut().enumerate() {
        if !options.is_page(file) {
            continue;
        }
        file.url = Some(make_url(
            &file.relative_path,
            &nav_options.index_patterns,
            nav_options.name_resolver.as_deref(),
        ));
        pages.push(index);
    }
    tracing::debug!(page_count = pages.len(), "Pages found");

    let files: &[ContentFile] = files;
    let navigation = Navigation::build(pages.iter().map(|&i| &files[i]), nav_options.clone());
    let views = pages
        .iter()
        .map(|&i| (i, Arc::new(navigation.for_url(&files[i].relative_path))))
        .collect();

    Scaffold {
        navigation: Arc::new(navigation),
        views,
    }
}
