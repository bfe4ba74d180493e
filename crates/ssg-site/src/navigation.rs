//! Navigation tree.
//!
//! Builds the site-wide navigation hierarchy from content files and derives
//! per-page views with the current item and its ancestors marked.
//!
//! # Architecture
//!
//! Nodes live in a flat `Vec` with parent and children tracked by index, the
//! same arena layout used for the site page tree. Index 0 is always the root
//! (URL `/`). A per-page view is a clone of the arena with selection marks
//! applied, so views never observe each other.
//!
//! Path segments without a content file of their own do not become nodes:
//! their descendants attach to the nearest ancestor that has one.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;
use ssg_storage::{ContentFile, Meta};

use crate::url::{IndexPattern, NameResolver, make_url};

/// Selection mark of a node in a per-page view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// The page being rendered.
    Current,
    /// An ancestor of the page being rendered.
    Parent,
}

/// Options for building and querying a [`Navigation`].
#[derive(Clone)]
pub struct NavOptions {
    /// Basename rules for directory index files.
    pub index_patterns: Vec<IndexPattern>,
    /// Applied to file paths (and queried URLs) before index collapsing.
    pub name_resolver: Option<Arc<NameResolver>>,
}

impl Default for NavOptions {
    fn default() -> Self {
        Self {
            index_patterns: IndexPattern::default_patterns(),
            name_resolver: None,
        }
    }
}

impl NavOptions {
    /// Replace the index patterns.
    #[must_use]
    pub fn with_index_patterns(mut self, patterns: Vec<IndexPattern>) -> Self {
        self.index_patterns = patterns;
        self
    }

    /// Set the name resolver.
    #[must_use]
    pub fn with_name_resolver(mut self, resolver: Arc<NameResolver>) -> Self {
        self.name_resolver = Some(resolver);
        self
    }

    fn url_for(&self, path: &str) -> String {
        make_url(path, &self.index_patterns, self.name_resolver.as_deref())
    }
}

impl fmt::Debug for NavOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavOptions")
            .field("index_patterns", &self.index_patterns)
            .field("name_resolver", &self.name_resolver.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Node {
    url: String,
    title: Option<String>,
    sort_order: f64,
    source: Option<String>,
    selected: Option<Selection>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Navigation data extracted from one content file.
struct Entry {
    url: String,
    title: Option<String>,
    sort_order: f64,
    source: String,
}

impl Entry {
    fn from_file(file: &ContentFile, options: &NavOptions) -> Self {
        let url = match &file.url {
            Some(url) => make_url(url, &options.index_patterns, None),
            None => options.url_for(&file.relative_path),
        };
        let title = meta_text(&file.meta, "navTitle").or_else(|| meta_text(&file.meta, "title"));
        let sort_order = file
            .meta
            .get("navOrder")
            .and_then(parse_order)
            .unwrap_or(0.0);

        Self {
            url,
            title,
            sort_order,
            source: file.relative_path.clone(),
        }
    }

    fn into_node(self, parent: Option<usize>) -> Node {
        Node {
            url: self.url,
            title: self.title,
            sort_order: self.sort_order,
            source: Some(self.source),
            selected: None,
            parent,
            children: Vec::new(),
        }
    }
}

/// Intermediate tree keyed by URL path segment.
#[derive(Default)]
struct Slot {
    entry: Option<Entry>,
    children: Vec<(String, Slot)>,
}

impl Slot {
    fn child(&mut self, segment: &str) -> &mut Slot {
        let position = match self.children.iter().position(|(s, _)| s == segment) {
            Some(position) => position,
            None => {
                self.children.push((segment.to_owned(), Slot::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[position].1
    }
}

/// Hierarchical navigation over a set of content files.
///
/// # Example
///
/// ```ignore
/// let navigation = Navigation::build(&files, NavOptions::default());
/// let view = navigation.for_url("about/index.html");
/// assert_eq!(view.current().map(|item| item.url()), Some("/about/"));
/// ```
#[derive(Clone, Debug)]
pub struct Navigation {
    nodes: Vec<Node>,
    options: Arc<NavOptions>,
}

impl Navigation {
    /// Build the canonical tree.
    ///
    /// Files with a truthy `navHidden` are skipped. When two files produce the
    /// same URL the later one wins. Siblings are ordered by `navOrder`
    /// (missing means `0`), ties keeping input order.
    pub fn build<'a, I>(files: I, options: NavOptions) -> Self
    where
        I: IntoIterator<Item = &'a ContentFile>,
    {
        let mut root = Slot::default();
        for file in files {
            if is_truthy(file.meta.get("navHidden")) {
                continue;
            }
            let entry = Entry::from_file(file, &options);
            if entry.url == "/" {
                root.entry = Some(entry);
                continue;
            }

            let mut slot = &mut root;
            for segment in entry.url.split('/').filter(|s| !s.is_empty()) {
                slot = slot.child(segment);
            }
            slot.entry = Some(entry);
        }

        let Slot { entry, children } = root;
        let mut root_node = match entry {
            Some(entry) => entry.into_node(None),
            None => Node {
                url: "/".to_owned(),
                title: None,
                sort_order: 0.0,
                source: None,
                selected: None,
                parent: None,
                children: Vec::new(),
            },
        };
        root_node.url = "/".to_owned();

        let mut nodes = vec![root_node];
        squash(children, 0, &mut nodes);
        sort_children(&mut nodes);

        tracing::debug!(node_count = nodes.len() - 1, "Navigation built");
        Self {
            nodes,
            options: Arc::new(options),
        }
    }

    /// Derive a view for the page at `url` (a path or URL; it is normalized).
    ///
    /// The matching node is marked [`Selection::Current`] and each ancestor,
    /// root included, [`Selection::Parent`]. A `url` of `/` marks only the
    /// root. An unknown `url` yields a view with nothing selected.
    #[must_use]
    pub fn for_url(&self, url: &str) -> Self {
        let mut view = self.clone();
        for node in &mut view.nodes {
            node.selected = None;
        }

        let target = self.options.url_for(url);
        if target == "/" {
            view.nodes[0].selected = Some(Selection::Current);
            return view;
        }

        let matches: Vec<usize> = (1..view.nodes.len())
            .filter(|&index| view.nodes[index].url == target)
            .collect();
        for index in matches {
            view.nodes[index].selected = Some(Selection::Current);
            let mut parent = view.nodes[index].parent;
            while let Some(ancestor) = parent {
                let node = &mut view.nodes[ancestor];
                if node.selected.is_none() {
                    node.selected = Some(Selection::Parent);
                }
                parent = view.nodes[ancestor].parent;
            }
        }
        view
    }

    /// Root item (URL `/`).
    #[must_use]
    pub fn root(&self) -> NavItem<'_> {
        NavItem {
            nav: self,
            index: 0,
        }
    }

    /// Top-level items.
    pub fn children(&self) -> impl ExactSizeIterator<Item = NavItem<'_>> {
        self.root().children()
    }

    /// Top-level item by position.
    #[must_use]
    pub fn child(&self, position: usize) -> Option<NavItem<'_>> {
        self.root().child(position)
    }

    /// Top-level item by URL.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<NavItem<'_>> {
        self.root().get(url)
    }

    /// Any item by URL, root included.
    #[must_use]
    pub fn find(&self, url: &str) -> Option<NavItem<'_>> {
        if self.nodes[0].url == url {
            return Some(self.root());
        }
        self.flatten().into_iter().find(|item| item.url() == url)
    }

    /// Every item below the root in depth-first order.
    #[must_use]
    pub fn flatten(&self) -> Vec<NavItem<'_>> {
        self.root().flatten()
    }

    /// The item marked [`Selection::Current`] in this view.
    #[must_use]
    pub fn current(&self) -> Option<NavItem<'_>> {
        if self.nodes[0].selected == Some(Selection::Current) {
            return Some(self.root());
        }
        self.flatten()
            .into_iter()
            .find(|item| item.selected() == Some(Selection::Current))
    }

    /// Number of items below the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Whether there are no items below the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Options the tree was built with.
    #[must_use]
    pub fn options(&self) -> &NavOptions {
        &self.options
    }
}

/// Attach slots with entries under `target`, lifting entry-less slots' children.
fn squash(children: Vec<(String, Slot)>, target: usize, nodes: &mut Vec<Node>) {
    for (_, Slot { entry, children }) in children {
        let next = match entry {
            Some(entry) => {
                let index = nodes.len();
                nodes.push(entry.into_node(Some(target)));
                nodes[target].children.push(index);
                index
            }
            None => target,
        };
        squash(children, next, nodes);
    }
}

fn sort_children(nodes: &mut [Node]) {
    let orders: Vec<f64> = nodes.iter().map(|n| n.sort_order).collect();
    for node in nodes.iter_mut() {
        // Stable: equal orders keep insertion order
        node.children.sort_by(|&a, &b| orders[a].total_cmp(&orders[b]));
    }
}

fn meta_text(meta: &Meta, key: &str) -> Option<String> {
    match meta.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_order(value: &Value) -> Option<f64> {
    let order = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    order.filter(|n: &f64| !n.is_nan())
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

/// Borrowed handle to one node of a [`Navigation`].
#[derive(Clone, Copy)]
pub struct NavItem<'a> {
    nav: &'a Navigation,
    index: usize,
}

impl<'a> NavItem<'a> {
    fn node(self) -> &'a Node {
        &self.nav.nodes[self.index]
    }

    /// Canonical URL.
    #[must_use]
    pub fn url(self) -> &'a str {
        &self.node().url
    }

    /// `navTitle`, falling back to `title`.
    #[must_use]
    pub fn title(self) -> Option<&'a str> {
        self.node().title.as_deref()
    }

    /// Sort key among siblings.
    #[must_use]
    pub fn sort_order(self) -> f64 {
        self.node().sort_order
    }

    /// Relative path of the content file behind this item.
    #[must_use]
    pub fn source(self) -> Option<&'a str> {
        self.node().source.as_deref()
    }

    /// Selection mark in this view.
    #[must_use]
    pub fn selected(self) -> Option<Selection> {
        self.node().selected
    }

    /// Whether this is the root item.
    #[must_use]
    pub fn is_root(self) -> bool {
        self.index == 0
    }

    /// Parent item, `None` for the root.
    #[must_use]
    pub fn parent(self) -> Option<NavItem<'a>> {
        let nav = self.nav;
        self.node().parent.map(|index| NavItem { nav, index })
    }

    /// Ordered child items.
    pub fn children(self) -> impl ExactSizeIterator<Item = NavItem<'a>> {
        let nav = self.nav;
        self.node()
            .children
            .iter()
            .map(move |&index| NavItem { nav, index })
    }

    /// Whether this item has children.
    #[must_use]
    pub fn has_children(self) -> bool {
        !self.node().children.is_empty()
    }

    /// Child by position.
    #[must_use]
    pub fn child(self, position: usize) -> Option<NavItem<'a>> {
        self.children().nth(position)
    }

    /// Direct child by URL.
    #[must_use]
    pub fn get(self, url: &str) -> Option<NavItem<'a>> {
        self.children().find(|item| item.url() == url)
    }

    /// Descendants in depth-first order, excluding this item.
    #[must_use]
    pub fn flatten(self) -> Vec<NavItem<'a>> {
        let nodes = &self.nav.nodes;
        let mut items = Vec::new();
        let mut stack: Vec<usize> = self.node().children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            items.push(NavItem {
                nav: self.nav,
                index,
            });
            stack.extend(nodes[index].children.iter().rev());
        }
        items
    }

    /// Owned, serializable copy of this subtree.
    #[must_use]
    pub fn to_entry(self) -> NavEntry {
        NavEntry {
            url: self.url().to_owned(),
            title: self.title().map(str::to_owned),
            selected: self.selected(),
            children: self.children().map(NavItem::to_entry).collect(),
        }
    }
}

impl fmt::Debug for NavItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavItem")
            .field("url", &self.url())
            .field("title", &self.title())
            .field("selected", &self.selected())
            .finish_non_exhaustive()
    }
}

/// Navigation item with children, for serialization and templates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavEntry {
    /// Canonical URL.
    pub url: String,
    /// Display title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Selection mark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<Selection>,
    /// Child items.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavEntry>,
}

impl Serialize for Navigation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root().to_entry().serialize(serializer)
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(f, self.root(), 0)
    }
}

fn write_tree(f: &mut fmt::Formatter<'_>, item: NavItem<'_>, depth: usize) -> fmt::Result {
    write!(
        f,
        "{:indent$}{} {}",
        "",
        item.title().unwrap_or("(untitled)"),
        item.url(),
        indent = depth * 2
    )?;
    match item.selected() {
        Some(Selection::Current) => f.write_str(" (current)")?,
        Some(Selection::Parent) => f.write_str(" (parent)")?,
        None => {}
    }
    for child in item.children() {
        f.write_str("\n")?;
        write_tree(f, child, depth + 1)?;
    }
    Ok(())
}
