//! Navigation: explicit entries from the site config, or derived from the page tree.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A navigation entry declared in the site configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NavEntry {
    /// Display title; defaults to the referenced page's title
    #[serde(default)]
    pub title: Option<String>,

    /// Page path relative to the docs directory, e.g. `roadmap.md`
    #[serde(default)]
    pub page: Option<String>,

    /// Nested entries
    #[serde(default)]
    pub children: Vec<NavEntry>,
}

/// A rendered navigation item.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NavItem {
    /// Display title
    pub title: String,
    /// URL path
    pub path: String,
    /// Child items
    pub children: Vec<NavItem>,
    /// Whether this is the active page
    pub active: bool,
}

/// What navigation needs to know about a page.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub relative_path: PathBuf,
    pub title: String,
    pub url: String,
    pub in_nav: bool,
}

/// A nav entry referenced a page that does not exist.
#[derive(Debug, thiserror::Error)]
#[error("Navigation references unknown page: {0}")]
pub struct UnknownPage(pub String);

/// Resolve configured entries against the discovered pages.
pub fn resolve(entries: &[NavEntry], pages: &[PageLink]) -> Result<Vec<NavItem>, UnknownPage> {
    let by_path: HashMap<&Path, &PageLink> = pages
        .iter()
        .map(|p| (p.relative_path.as_path(), p))
        .collect();

    entries
        .iter()
        .map(|entry| resolve_entry(entry, &by_path))
        .collect()
}

fn resolve_entry(
    entry: &NavEntry,
    by_path: &HashMap<&Path, &PageLink>,
) -> Result<NavItem, UnknownPage> {
    let children = entry
        .children
        .iter()
        .map(|child| resolve_entry(child, by_path))
        .collect::<Result<Vec<_>, _>>()?;

    let page = match &entry.page {
        Some(page) => Some(
            by_path
                .get(Path::new(page))
                .copied()
                .ok_or_else(|| UnknownPage(page.clone()))?,
        ),
        None => None,
    };

    let title = entry
        .title
        .clone()
        .or_else(|| page.map(|p| p.title.clone()))
        .unwrap_or_else(|| "Section".to_string());

    // A pure section header links to its first child.
    let path = page
        .map(|p| p.url.clone())
        .or_else(|| children.first().map(|c| c.path.clone()))
        .unwrap_or_default();

    Ok(NavItem {
        title,
        path,
        children,
        active: false,
    })
}

/// A directory in derived navigation.
#[derive(Default)]
struct Section {
    index_url: Option<String>,
    pages: Vec<NavItem>,
    subsections: BTreeMap<String, Section>,
}

impl Section {
    /// Pages first, then one item per subdirectory in lexical order.
    fn into_items(self) -> Vec<NavItem> {
        let mut items = self.pages;

        for (name, section) in self.subsections {
            let index_url = section.index_url.clone();
            let children = section.into_items();
            let path = index_url
                .or_else(|| children.iter().map(|c| c.path.clone()).find(|p| !p.is_empty()))
                .unwrap_or_default();

            items.push(NavItem {
                title: capitalize(&name),
                path,
                children,
                active: false,
            });
        }

        items
    }
}

/// Derive navigation from pages already sorted in display order.
///
/// Root pages come first, then one section per directory in lexical order, nested
/// to the depth of the directory tree. A directory's `index.md` becomes the section
/// link.
pub fn derive(pages: &[PageLink]) -> Vec<NavItem> {
    let mut root = Section::default();

    for page in pages.iter().filter(|p| p.in_nav) {
        let dirs: Vec<String> = page
            .relative_path
            .parent()
            .unwrap_or(Path::new(""))
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let is_index = page.relative_path.file_stem().and_then(|s| s.to_str()) == Some("index");

        let section = dirs
            .iter()
            .fold(&mut root, |section, dir| section.subsections.entry(dir.clone()).or_default());

        if is_index && !dirs.is_empty() {
            section.index_url = Some(page.url.clone());
        } else {
            section.pages.push(NavItem {
                title: page.title.clone(),
                path: page.url.clone(),
                children: Vec::new(),
                active: false,
            });
        }
    }

    root.into_items()
}

/// Copy of `nav` with the item pointing at `url` (and its ancestors) marked active.
pub fn mark_active(nav: &[NavItem], url: &str) -> Vec<NavItem> {
    nav.iter()
        .map(|item| {
            let children = mark_active(&item.children, url);
            let active = item.path == url || children.iter().any(|c| c.active);
            NavItem {
                title: item.title.clone(),
                path: item.path.clone(),
                children,
                active,
            }
        })
        .collect()
}

/// Capitalize first letter of a string.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
