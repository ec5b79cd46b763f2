//! Static site builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;

use rayon::prelude::*;
use regex::Regex;
use walkdir::WalkDir;

use folio_md::{parse_page, ParsedPage};

use crate::assets::AssetPipeline;
use crate::nav::{self, NavEntry, NavItem, PageLink};
use crate::templates::{Context, TemplateEngine, TocEntry};

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Source docs directory
    pub docs_dir: PathBuf,

    /// Output directory. Replaced wholesale by a successful build.
    pub output_dir: PathBuf,

    /// Minify CSS output
    pub minify: bool,

    /// Base URL for the site
    pub base_url: String,

    /// Site title
    pub title: String,

    /// Extra CSS stylesheets to copy into `assets/`
    pub styles: Vec<PathBuf>,

    /// Hostname written to `CNAME`
    pub cname: Option<String>,

    /// Write an empty `.nojekyll` marker
    pub nojekyll: bool,

    /// Explicit navigation; derived from the page tree when `None`
    pub nav: Option<Vec<NavEntry>>,

    /// Theme directory with optional `templates/` and `assets/`
    pub theme_dir: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("docs"),
            output_dir: PathBuf::from("site"),
            minify: true,
            base_url: "/".to_string(),
            title: "Documentation".to_string(),
            styles: vec![],
            cname: None,
            nojekyll: true,
            nav: None,
            theme_dir: None,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Number of files in the output tree
    pub files: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Invalid build configuration: {0}")]
    ConfigError(String),

    #[error("Failed to read docs directory: {0}")]
    ReadError(String),

    #[error("Failed to parse markdown: {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Pages {first} and {second} both render to {output}")]
    DuplicateOutput {
        output: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    NavError(#[from] nav::UnknownPage),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// A page to be built.
#[derive(Debug)]
struct PageInfo {
    /// Relative path from docs dir
    relative_path: PathBuf,

    /// Output path relative to the output root
    output_path: PathBuf,

    /// Public URL
    url: String,

    /// Parsed document
    doc: ParsedPage,
}

impl PageInfo {
    fn title(&self) -> String {
        self.doc.title().map(str::to_string).unwrap_or_else(|| {
            self.relative_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        })
    }
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
}

impl StaticBuilder {
    /// Create a new static builder.
    ///
    /// Loads theme templates eagerly, so a broken theme fails here rather than midway
    /// through a build.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        let templates = match config.theme_dir.as_ref().map(|d| d.join("templates")) {
            Some(dir) if dir.is_dir() => {
                tracing::info!("Loading theme templates from {}", dir.display());
                TemplateEngine::with_theme(&dir)
                    .map_err(|e| BuildError::TemplateError(e.to_string()))?
            }
            _ => TemplateEngine::new(),
        };

        Ok(Self { config, templates })
    }

    /// Build the static site.
    ///
    /// Everything is written into a staging directory next to the output directory;
    /// the previous output is only replaced once the whole site has been generated.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        self.validate()?;

        let pages = self.discover_pages()?;
        let nav = self.build_navigation(&pages)?;

        let staging = self.staging_dir()?;
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| write_error(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| write_error(&staging, e))?;

        let files = match self.generate(&staging, &pages, &nav) {
            Ok(files) => files,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };

        self.swap_into_place(&staging)?;

        Ok(BuildResult {
            pages: pages.len(),
            files,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Reject configurations that would write outside the output directory or
    /// delete the sources.
    fn validate(&self) -> Result<(), BuildError> {
        if !self.config.base_url.starts_with('/') || !self.config.base_url.ends_with('/') {
            return Err(BuildError::ConfigError(format!(
                "base_url must start and end with '/': {}",
                self.config.base_url
            )));
        }

        if let Some(cname) = &self.config.cname {
            if !hostname_pattern().is_match(cname) {
                return Err(BuildError::ConfigError(format!(
                    "cname is not a valid hostname: {}",
                    cname
                )));
            }
        }

        let docs = absolute(&self.config.docs_dir)?;
        let output = absolute(&self.config.output_dir)?;
        if docs.starts_with(&output) || output.starts_with(&docs) {
            return Err(BuildError::ConfigError(format!(
                "output directory {} overlaps docs directory {}",
                self.config.output_dir.display(),
                self.config.docs_dir.display()
            )));
        }

        Ok(())
    }

    /// Discover all markdown pages in the docs directory, in display order.
    fn discover_pages(&self) -> Result<Vec<PageInfo>, BuildError> {
        if !self.config.docs_dir.is_dir() {
            return Err(BuildError::ReadError(format!(
                "Docs directory not found: {}",
                self.config.docs_dir.display()
            )));
        }

        let mut pages = Vec::new();
        let mut outputs: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

        for entry in WalkDir::new(&self.config.docs_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| BuildError::ReadError(e.to_string()))?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }

            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }

            let content = fs::read_to_string(path)
                .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

            let doc = parse_page(&content).map_err(|e| BuildError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

            let relative_path = path
                .strip_prefix(&self.config.docs_dir)
                .unwrap_or(path)
                .to_path_buf();

            let meta = doc.meta();
            if meta.draft {
                tracing::debug!("Skipping draft {}", relative_path.display());
                continue;
            }

            let output_path = output_path_for(&relative_path, meta.slug.as_deref())?;

            if let Some(first) = outputs.insert(output_path.clone(), relative_path.clone()) {
                return Err(BuildError::DuplicateOutput {
                    output: output_path.display().to_string(),
                    first: first.display().to_string(),
                    second: relative_path.display().to_string(),
                });
            }

            let url = self.url_for(&output_path);

            pages.push(PageInfo {
                relative_path,
                output_path,
                url,
                doc,
            });
        }

        // Stable: ties keep the sorted walk order.
        pages.sort_by_key(|p| p.doc.frontmatter.as_ref().and_then(|f| f.order).unwrap_or(999));

        tracing::debug!("Discovered {} pages", pages.len());

        Ok(pages)
    }

    /// Build navigation structure from pages.
    fn build_navigation(&self, pages: &[PageInfo]) -> Result<Vec<NavItem>, BuildError> {
        let links: Vec<PageLink> = pages
            .iter()
            .map(|p| PageLink {
                relative_path: p.relative_path.clone(),
                title: p.title(),
                url: p.url.clone(),
                in_nav: p.doc.meta().nav,
            })
            .collect();

        match &self.config.nav {
            Some(entries) => Ok(nav::resolve(entries, &links)?),
            None => Ok(nav::derive(&links)),
        }
    }

    /// Convert an output path to a URL.
    fn url_for(&self, output_path: &Path) -> String {
        let dir: Vec<String> = output_path
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();

        if dir.is_empty() {
            self.config.base_url.clone()
        } else {
            format!("{}{}/", self.config.base_url, dir.join("/"))
        }
    }

    fn staging_dir(&self) -> Result<PathBuf, BuildError> {
        let name = self
            .config
            .output_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                BuildError::ConfigError(format!(
                    "output directory needs a name: {}",
                    self.config.output_dir.display()
                ))
            })?;

        Ok(self
            .config
            .output_dir
            .with_file_name(format!(".{}.staging", name)))
    }

    /// Write pages, assets, and indexes into `root`. Returns the file count.
    fn generate(
        &self,
        root: &Path,
        pages: &[PageInfo],
        nav: &[NavItem],
    ) -> Result<usize, BuildError> {
        // Render pages in parallel; report the first failure in page order.
        pages
            .par_iter()
            .map(|page| self.build_page(root, page, nav))
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<Vec<()>, _>>()?;

        let mut files = pages.len();
        files += self.generate_assets(root)?;
        files += self.generate_search_index(root, pages)?;
        files += self.generate_sitemap(root, pages)?;
        files += self.generate_hosting_files(root)?;

        Ok(files)
    }

    /// Build a single page.
    fn build_page(&self, root: &Path, page: &PageInfo, nav: &[NavItem]) -> Result<(), BuildError> {
        let toc: Vec<TocEntry> = page
            .doc
            .toc
            .iter()
            .filter(|e| e.level > 1)
            .map(|e| TocEntry {
                title: e.title.clone(),
                id: e.id.clone(),
                level: e.level,
            })
            .collect();

        let context = Context {
            title: page.title(),
            description: page.doc.meta().description,
            site_title: self.config.title.clone(),
            content: page.doc.html.clone(),
            nav: nav::mark_active(nav, &page.url),
            toc,
            base_url: self.config.base_url.clone(),
            page_url: page.url.clone(),
            styles: self
                .config
                .styles
                .iter()
                .map(|s| format!("{}assets/{}", self.config.base_url, style_file_name(s)))
                .collect(),
        };

        let html = self
            .templates
            .render_page("page.html", &context)
            .map_err(|e| {
                BuildError::TemplateError(format!("{}: {}", page.relative_path.display(), e))
            })?;

        let target = root.join(&page.output_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
        }

        fs::write(&target, html).map_err(|e| write_error(&target, e))?;

        Ok(())
    }

    /// Generate static assets.
    fn generate_assets(&self, root: &Path) -> Result<usize, BuildError> {
        let assets_dir = root.join("assets");
        fs::create_dir_all(&assets_dir).map_err(|e| write_error(&assets_dir, e))?;

        let css = AssetPipeline::generate_css();
        let css = if self.config.minify {
            AssetPipeline::minify_css(&css).map_err(BuildError::WriteError)?
        } else {
            css
        };
        write_file(&assets_dir.join("main.css"), css)?;
        write_file(&assets_dir.join("main.js"), AssetPipeline::generate_js())?;

        let mut files = 2;

        if let Some(theme_assets) = self.config.theme_dir.as_ref().map(|d| d.join("assets")) {
            if theme_assets.is_dir() {
                files += AssetPipeline::copy_tree(&theme_assets, &assets_dir)
                    .map_err(|e| write_error(&theme_assets, e))?;
            }
        }

        for style_path in &self.config.styles {
            let content = fs::read_to_string(style_path).map_err(|e| {
                BuildError::ReadError(format!(
                    "Failed to read stylesheet {}: {}",
                    style_path.display(),
                    e
                ))
            })?;
            let content = if self.config.minify {
                AssetPipeline::minify_css(&content).map_err(|e| {
                    BuildError::ParseError {
                        path: style_path.display().to_string(),
                        message: e,
                    }
                })?
            } else {
                content
            };
            write_file(&assets_dir.join(style_file_name(style_path)), content)?;
            files += 1;
        }

        Ok(files)
    }

    /// Generate search index.
    fn generate_search_index(&self, root: &Path, pages: &[PageInfo]) -> Result<usize, BuildError> {
        let index: Vec<serde_json::Value> = pages
            .iter()
            .map(|page| {
                serde_json::json!({
                    "title": page.title(),
                    "description": page.doc.meta().description.unwrap_or_default(),
                    "url": page.url,
                    "content": summary(&page.doc.text, 300),
                })
            })
            .collect();

        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        write_file(&root.join("search-index.json"), json)?;

        Ok(1)
    }

    /// Generate sitemap and robots.txt.
    fn generate_sitemap(&self, root: &Path, pages: &[PageInfo]) -> Result<usize, BuildError> {
        let urls: Vec<String> = pages
            .iter()
            .map(|page| {
                format!(
                    "  <url>\n    <loc>{}</loc>\n  </url>",
                    self.absolute_url(&page.url)
                )
            })
            .collect();

        let sitemap = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
{}
</urlset>
"#,
            urls.join("\n")
        );

        write_file(&root.join("sitemap.xml"), sitemap)?;

        let robots = format!(
            "User-agent: *\nAllow: /\nSitemap: {}\n",
            self.absolute_url(&format!("{}sitemap.xml", self.config.base_url))
        );
        write_file(&root.join("robots.txt"), robots)?;

        Ok(2)
    }

    /// Write `CNAME` and `.nojekyll` for static hosting.
    fn generate_hosting_files(&self, root: &Path) -> Result<usize, BuildError> {
        let mut files = 0;

        if let Some(cname) = &self.config.cname {
            write_file(&root.join("CNAME"), format!("{}\n", cname))?;
            files += 1;
        }

        if self.config.nojekyll {
            write_file(&root.join(".nojekyll"), String::new())?;
            files += 1;
        }

        Ok(files)
    }

    fn absolute_url(&self, url: &str) -> String {
        match &self.config.cname {
            Some(host) => format!("https://{}{}", host, url),
            None => url.to_string(),
        }
    }

    /// Replace the output directory with the fully generated staging directory.
    fn swap_into_place(&self, staging: &Path) -> Result<(), BuildError> {
        let output = &self.config.output_dir;

        if output.exists() {
            fs::remove_dir_all(output).map_err(|e| write_error(output, e))?;
        }

        fs::rename(staging, output).map_err(|e| write_error(output, e))?;

        tracing::debug!("Moved {} into place", output.display());

        Ok(())
    }
}

/// Calculate the output path of a page, relative to the output root.
///
/// `index.md` maps to `index.html`; any other page `name.md` to `name/index.html`.
/// A `slug` replaces the whole directory path.
fn output_path_for(relative: &Path, slug: Option<&str>) -> Result<PathBuf, BuildError> {
    if let Some(slug) = slug {
        let slug_path = Path::new(slug.trim_matches('/'));
        let safe = slug_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(BuildError::ParseError {
                path: relative.display().to_string(),
                message: format!("invalid slug: {}", slug),
            });
        }
        return Ok(slug_path.join("index.html"));
    }

    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("index");
    let parent = relative.parent().unwrap_or(Path::new(""));

    if stem == "index" {
        Ok(parent.join("index.html"))
    } else {
        Ok(parent.join(stem).join("index.html"))
    }
}

fn style_file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("style.css")
        .to_string()
}

/// First `max_chars` characters of `text`, cut at a word boundary.
fn summary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(pos) => cut[..pos].to_string(),
        None => cut,
    }
}

fn hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$")
            .expect("hostname pattern is valid")
    })
}

fn absolute(path: &Path) -> Result<PathBuf, BuildError> {
    std::path::absolute(path)
        .map_err(|e| BuildError::ConfigError(format!("{}: {}", path.display(), e)))
}

fn write_file(path: &Path, content: String) -> Result<(), BuildError> {
    fs::write(path, content).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, e: std::io::Error) -> BuildError {
    BuildError::WriteError(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn site(files: &[(&str, &str)]) -> (tempfile::TempDir, BuildConfig) {
        let temp = tempdir().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        for (name, content) in files {
            let path = docs.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        let config = BuildConfig {
            docs_dir: docs,
            output_dir: temp.path().join("site"),
            ..Default::default()
        };
        (temp, config)
    }

    fn tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap();
                (
                    rel.to_string_lossy().replace('\\', "/"),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn builds_simple_site() {
        let (_temp, config) = site(&[
            ("index.md", "---\ntitle: Home\n---\n# Welcome\n"),
            ("roadmap.md", "# Roadmap\n\n## Stochastic calculus\n"),
        ]);
        let out = config.output_dir.clone();

        let result = StaticBuilder::new(config).unwrap().build().await.unwrap();

        assert_eq!(result.pages, 2);
        let files: Vec<String> = tree(&out).into_keys().collect();
        assert_eq!(
            files,
            vec![
                ".nojekyll",
                "assets/main.css",
                "assets/main.js",
                "index.html",
                "roadmap/index.html",
                "robots.txt",
                "search-index.json",
                "sitemap.xml",
            ]
        );
        assert_eq!(result.files, files.len());

        let roadmap = fs::read_to_string(out.join("roadmap/index.html")).unwrap();
        assert!(roadmap.contains("<title>Roadmap - Documentation</title>"));
        assert!(roadmap.contains(r##"<a href="#stochastic-calculus">"##));
    }

    #[tokio::test]
    async fn rebuild_is_byte_identical() {
        let (_temp, config) = site(&[
            ("index.md", "# Home\n"),
            ("pricing/black-scholes.md", "# Black-Scholes\n\n| a | b |\n|---|---|\n| 1 | 2 |\n"),
            ("pricing/monte-carlo.md", "# Monte Carlo\n"),
        ]);
        let out = config.output_dir.clone();
        let builder = StaticBuilder::new(config).unwrap();

        builder.build().await.unwrap();
        let first = tree(&out);
        builder.build().await.unwrap();
        let second = tree(&out);

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn removed_page_disappears_from_output() {
        let (_temp, config) = site(&[("index.md", "# Home\n"), ("old.md", "# Old\n")]);
        let out = config.output_dir.clone();
        let docs = config.docs_dir.clone();
        let builder = StaticBuilder::new(config).unwrap();

        builder.build().await.unwrap();
        assert!(out.join("old/index.html").exists());

        fs::remove_file(docs.join("old.md")).unwrap();
        builder.build().await.unwrap();

        assert!(!out.join("old").exists());
        assert!(out.join("index.html").exists());
    }

    #[tokio::test]
    async fn markup_error_leaves_previous_output() {
        let (_temp, config) = site(&[("index.md", "# Home\n")]);
        let out = config.output_dir.clone();
        let docs = config.docs_dir.clone();
        let builder = StaticBuilder::new(config).unwrap();

        builder.build().await.unwrap();
        let before = tree(&out);

        fs::write(docs.join("broken.md"), "---\ntitle: [unclosed\n---\n").unwrap();
        let err = builder.build().await.unwrap_err();

        assert!(matches!(err, BuildError::ParseError { .. }));
        assert_eq!(tree(&out), before);
        assert!(!out.with_file_name(".site.staging").exists());
    }

    #[tokio::test]
    async fn drafts_are_skipped() {
        let (_temp, config) = site(&[
            ("index.md", "# Home\n"),
            ("wip.md", "---\ndraft: true\n---\n# WIP\n"),
        ]);
        let out = config.output_dir.clone();

        let result = StaticBuilder::new(config).unwrap().build().await.unwrap();

        assert_eq!(result.pages, 1);
        assert!(!out.join("wip").exists());
    }

    #[tokio::test]
    async fn duplicate_outputs_are_rejected() {
        let (_temp, config) = site(&[
            ("a.md", "---\nslug: same\n---\n# A\n"),
            ("b.md", "---\nslug: same\n---\n# B\n"),
        ]);

        let err = StaticBuilder::new(config).unwrap().build().await.unwrap_err();

        assert!(matches!(err, BuildError::DuplicateOutput { .. }));
    }

    #[tokio::test]
    async fn writes_cname_and_absolute_sitemap() {
        let (_temp, mut config) = site(&[("index.md", "# Home\n")]);
        config.cname = Some("docs.example.com".to_string());
        let out = config.output_dir.clone();

        StaticBuilder::new(config).unwrap().build().await.unwrap();

        assert_eq!(
            fs::read_to_string(out.join("CNAME")).unwrap(),
            "docs.example.com\n"
        );
        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://docs.example.com/</loc>"));
    }

    #[tokio::test]
    async fn invalid_cname_is_a_config_error() {
        let (_temp, mut config) = site(&[("index.md", "# Home\n")]);
        config.cname = Some("not a host".to_string());

        let err = StaticBuilder::new(config).unwrap().build().await.unwrap_err();

        assert!(matches!(err, BuildError::ConfigError(_)));
    }

    #[tokio::test]
    async fn output_inside_docs_is_rejected() {
        let (_temp, mut config) = site(&[("index.md", "# Home\n")]);
        config.output_dir = config.docs_dir.join("site");

        let err = StaticBuilder::new(config).unwrap().build().await.unwrap_err();

        assert!(matches!(err, BuildError::ConfigError(_)));
    }

    #[tokio::test]
    async fn explicit_nav_must_reference_pages() {
        let (_temp, mut config) = site(&[("index.md", "# Home\n")]);
        config.nav = Some(vec![NavEntry {
            title: Some("Missing".to_string()),
            page: Some("missing.md".to_string()),
            children: vec![],
        }]);

        let err = StaticBuilder::new(config).unwrap().build().await.unwrap_err();

        assert!(matches!(err, BuildError::NavError(_)));
    }

    #[tokio::test]
    async fn theme_assets_and_templates_are_used() {
        let (temp, mut config) = site(&[("index.md", "# Home\n")]);
        let theme = temp.path().join("theme");
        fs::create_dir_all(theme.join("templates")).unwrap();
        fs::create_dir_all(theme.join("assets")).unwrap();
        fs::write(theme.join("assets/theme.css"), "body{}").unwrap();
        fs::write(
            theme.join("templates/nav.html"),
            r#"<p class="themed-nav">{{ site_title }}</p>"#,
        )
        .unwrap();
        config.theme_dir = Some(theme);
        let out = config.output_dir.clone();

        StaticBuilder::new(config).unwrap().build().await.unwrap();

        assert!(out.join("assets/theme.css").is_file());
        let index = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(index.contains(r#"<p class="themed-nav">Documentation</p>"#));
    }

    #[tokio::test]
    async fn search_index_lists_pages_in_order() {
        let (_temp, config) = site(&[
            ("a.md", "---\ntitle: Second\norder: 2\n---\nBody two."),
            ("b.md", "---\ntitle: First\norder: 1\ndescription: Intro\n---\nBody one."),
        ]);
        let out = config.output_dir.clone();

        StaticBuilder::new(config).unwrap().build().await.unwrap();

        let index: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(out.join("search-index.json")).unwrap())
                .unwrap();
        assert_eq!(index[0]["title"], "First");
        assert_eq!(index[0]["description"], "Intro");
        assert_eq!(index[0]["url"], "/b/");
        assert_eq!(index[0]["content"], "Body one.");
        assert_eq!(index[1]["title"], "Second");
    }

    #[test]
    fn output_paths() {
        assert_eq!(
            output_path_for(Path::new("index.md"), None).unwrap(),
            PathBuf::from("index.html")
        );
        assert_eq!(
            output_path_for(Path::new("roadmap.md"), None).unwrap(),
            PathBuf::from("roadmap/index.html")
        );
        assert_eq!(
            output_path_for(Path::new("pricing/index.md"), None).unwrap(),
            PathBuf::from("pricing/index.html")
        );
        assert_eq!(
            output_path_for(Path::new("x.md"), Some("/guides/start/")).unwrap(),
            PathBuf::from("guides/start/index.html")
        );
        assert!(output_path_for(Path::new("x.md"), Some("../escape")).is_err());
    }

    #[test]
    fn summary_cuts_on_word_boundary() {
        assert_eq!(summary("short", 10), "short");
        assert_eq!(summary("alpha beta gamma", 12), "alpha beta");
    }
}
