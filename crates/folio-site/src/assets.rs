//! Asset pipeline for CSS and JavaScript processing.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Generate the main CSS file.
    pub fn generate_css() -> String {
        DEFAULT_CSS.to_string()
    }

    /// Generate the main JavaScript file.
    pub fn generate_js() -> String {
        DEFAULT_JS.to_string()
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }

    /// Copy every file under `from` into `to`, preserving relative paths.
    ///
    /// Returns the number of files copied. Entries are visited in sorted order.
    pub fn copy_tree(from: &Path, to: &Path) -> io::Result<usize> {
        let mut copied = 0;

        for entry in WalkDir::new(from).sort_by_file_name() {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(from)
                .map_err(io::Error::other)?;
            let target = to.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }

        Ok(copied)
    }
}

const DEFAULT_CSS: &str = r#"/* folio default theme */

:root {
  --sidebar-width: 260px;
  --toc-width: 200px;
  --content-max-width: 780px;
  --background: #ffffff;
  --foreground: #1f2328;
  --muted: #f6f8fa;
  --muted-foreground: #59636e;
  --border: #d1d9e0;
  --primary: #0969da;
  --primary-foreground: #ffffff;
  --radius: 0.375rem;
}

@media (prefers-color-scheme: dark) {
  :root {
    --background: #0d1117;
    --foreground: #e6edf3;
    --muted: #151b23;
    --muted-foreground: #9198a1;
    --border: #3d444d;
    --primary: #4493f8;
  }
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.6;
}

.layout {
  display: grid;
  grid-template-columns: var(--sidebar-width) 1fr;
  min-height: 100vh;
}

.sidebar {
  background: var(--muted);
  border-right: 1px solid var(--border);
  padding: 1.5rem;
  position: sticky;
  top: 0;
  height: 100vh;
  overflow-y: auto;
}

.nav-header {
  margin-bottom: 1.5rem;
}

.nav-logo {
  font-weight: 700;
  font-size: 1.25rem;
  color: var(--foreground);
  text-decoration: none;
}

.nav-list,
.nav-children {
  list-style: none;
}

.nav-children {
  margin-left: 1rem;
}

.nav-item a {
  display: block;
  padding: 0.375rem 0.75rem;
  color: var(--muted-foreground);
  text-decoration: none;
  border-radius: var(--radius);
}

.nav-item.active > a {
  background: var(--primary);
  color: var(--primary-foreground);
}

.main {
  display: grid;
  grid-template-columns: 1fr var(--toc-width);
  gap: 2rem;
  padding: 2rem;
  max-width: calc(var(--content-max-width) + var(--toc-width) + 4rem);
}

.content h1 {
  font-size: 2.25rem;
  margin-bottom: 1.5rem;
}

.content h2 {
  font-size: 1.5rem;
  margin: 2rem 0 1rem;
  padding-bottom: 0.5rem;
  border-bottom: 1px solid var(--border);
}

.content h3 {
  font-size: 1.25rem;
  margin: 1.5rem 0 0.75rem;
}

.content p,
.content ul,
.content ol,
.content table {
  margin-bottom: 1rem;
}

.content li {
  margin-left: 1.5rem;
}

.content a {
  color: var(--primary);
}

.content table {
  border-collapse: collapse;
}

.content th,
.content td {
  border: 1px solid var(--border);
  padding: 0.375rem 0.75rem;
}

.content pre {
  background: var(--muted);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 1rem;
  overflow-x: auto;
  font-size: 0.875rem;
  margin-bottom: 1rem;
  position: relative;
}

.content code {
  font-family: ui-monospace, monospace;
  font-size: 0.875em;
}

.search {
  margin-bottom: 1.25rem;
}

.search-input {
  width: 100%;
  padding: 0.4rem 0.6rem;
  font: inherit;
  font-size: 0.875rem;
  border: 1px solid var(--border);
  border-radius: var(--radius);
  background: var(--background);
  color: var(--foreground);
}

.search-results {
  list-style: none;
  margin-top: 0.5rem;
}

.search-results li {
  padding: 0.35rem 0;
  border-bottom: 1px solid var(--border);
}

.search-results small {
  display: block;
  color: var(--muted-foreground);
}

.content .heading-anchor {
  margin-left: 0.4rem;
  color: var(--muted-foreground);
  text-decoration: none;
  visibility: hidden;
}

.content :is(h2, h3, h4):hover .heading-anchor {
  visibility: visible;
}

.toc {
  position: sticky;
  top: 2rem;
  align-self: start;
}

.toc h2 {
  font-size: 0.75rem;
  text-transform: uppercase;
  color: var(--muted-foreground);
  margin-bottom: 0.75rem;
}

.toc ul {
  list-style: none;
}

.toc a {
  font-size: 0.875rem;
  color: var(--muted-foreground);
  text-decoration: none;
}

.toc-level-3 {
  padding-left: 1rem;
}

.toc-level-4 {
  padding-left: 2rem;
}

.menu-btn {
  display: none;
  position: fixed;
  top: 1rem;
  left: 1rem;
  z-index: 100;
  padding: 0.5rem;
  background: var(--primary);
  color: var(--primary-foreground);
  border: none;
  border-radius: var(--radius);
  cursor: pointer;
}

@media (max-width: 1024px) {
  .layout,
  .main {
    grid-template-columns: 1fr;
  }

  .sidebar {
    position: fixed;
    left: -100%;
    z-index: 50;
    width: var(--sidebar-width);
    transition: left 0.3s;
  }

  .sidebar.open {
    left: 0;
  }

  .toc {
    display: none;
  }

  .menu-btn {
    display: block;
  }
}
"#;

const DEFAULT_JS: &str = r#"// folio runtime: sidebar toggle, heading links, page search
(function () {
  var script = document.currentScript;
  var base = (script && script.dataset.baseUrl) || '/';

  var sidebar = document.querySelector('.sidebar');
  var toggle = document.querySelector('.menu-btn');
  if (sidebar && toggle) {
    toggle.onclick = function () {
      sidebar.classList.toggle('open');
    };
  }

  var headings = document.querySelectorAll('.content h2[id], .content h3[id], .content h4[id]');
  Array.prototype.forEach.call(headings, function (h) {
    var link = document.createElement('a');
    link.className = 'heading-anchor';
    link.href = '#' + h.id;
    link.textContent = '#';
    h.appendChild(link);
  });

  var input = document.querySelector('.search-input');
  var results = document.querySelector('.search-results');
  if (!input || !results) return;

  var pages = null;
  function load() {
    if (pages) return Promise.resolve(pages);
    return fetch(base + 'search-index.json')
      .then(function (r) { return r.ok ? r.json() : []; })
      .then(function (data) { pages = data; return data; })
      .catch(function () { pages = []; return pages; });
  }

  function render(query) {
    results.innerHTML = '';
    var terms = query.toLowerCase().split(/\s+/).filter(Boolean);
    if (!terms.length) {
      results.hidden = true;
      return;
    }
    load().then(function (all) {
      var hits = all.filter(function (page) {
        var haystack = (page.title + ' ' + page.description + ' ' + page.content).toLowerCase();
        return terms.every(function (t) { return haystack.indexOf(t) !== -1; });
      }).slice(0, 10);
      results.innerHTML = '';
      hits.forEach(function (page) {
        var item = document.createElement('li');
        var link = document.createElement('a');
        link.href = page.url;
        link.textContent = page.title;
        item.appendChild(link);
        if (page.description) {
          var note = document.createElement('small');
          note.textContent = page.description;
          item.appendChild(note);
        }
        results.appendChild(item);
      });
      results.hidden = hits.length === 0;
    });
  }

  input.addEventListener('input', function () { render(input.value); });
})();
"#;
