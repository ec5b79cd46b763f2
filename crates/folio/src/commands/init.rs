//! Scaffold a documentation project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command in `root`.
pub fn run(root: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing folio...");

    let docs_dir = root.join("docs");

    if docs_dir.exists() {
        if !yes {
            tracing::warn!("docs/ directory already exists. Use --yes to overwrite.");
            return Ok(());
        }
    } else {
        fs::create_dir_all(&docs_dir).context("Failed to create docs directory")?;
    }

    let manifest = default_manifest();
    let files = [
        ("folio.toml", DEFAULT_CONFIG),
        ("folio.toolchain.toml", manifest.as_str()),
        ("docs/index.md", DEFAULT_INDEX),
        ("docs/roadmap.md", DEFAULT_ROADMAP),
    ];

    for (name, content) in files {
        let path = root.join(name);
        if path.exists() && !yes {
            continue;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", name))?;
        tracing::info!("Created {}", name);
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'folio build' then 'folio serve' to preview the site.");

    Ok(())
}

fn default_manifest() -> String {
    format!(
        "# Pinned toolchain. Changing this file provisions a fresh environment.\n\
         \n\
         [toolchain]\n\
         folio = \"{}\"\n\
         \n\
         # Themes are pinned to a full commit or a vendored directory digest:\n\
         #\n\
         # [dependencies.classic]\n\
         # git = \"https://github.com/folio-docs/classic.git\"\n\
         # rev = \"<40-character commit id>\"\n",
        env!("CARGO_PKG_VERSION")
    )
}

const DEFAULT_CONFIG: &str = r#"# folio configuration

[site]
title = "My Documentation"
base_url = "/"
# cname = "docs.example.com"
# theme = "classic"

[docs]
# Markdown sources
dir = "docs"

# Generated site
output = "site"

[build]
minify = true

[publish]
branch = "gh-pages"
remote = "origin"
primary_branch = "main"
force_orphan = true
allow_empty_commit = false
keep_files = false
"#;

const DEFAULT_INDEX: &str = r#"---
title: Welcome
order: 1
---

# Welcome

This site is built by **folio** from the markdown files in `docs/`.

See the [roadmap](/roadmap/) for what comes next.
"#;

const DEFAULT_ROADMAP: &str = r#"---
title: Roadmap
order: 2
---

# Roadmap

## Writing pages

Every `.md` file under `docs/` becomes a page. `docs/guide.md` is served at
`/guide/`, and `docs/index.md` at `/`.

Frontmatter is optional:

```yaml
---
title: Page Title
order: 1
draft: false
---
```

## Publishing

Pushes to `main` run `folio deploy`, which builds the site and replaces the
`gh-pages` branch with a single commit holding the output.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scaffolds_project() {
        let dir = tempdir().unwrap();

        run(dir.path(), false).unwrap();

        for name in ["folio.toml", "folio.toolchain.toml", "docs/index.md", "docs/roadmap.md"] {
            assert!(dir.path().join(name).is_file(), "missing {}", name);
        }
        let manifest = fs::read_to_string(dir.path().join("folio.toolchain.toml")).unwrap();
        assert!(manifest.contains(&format!("folio = \"{}\"", env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn leaves_existing_docs_alone_without_yes() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.md"), "# Mine\n").unwrap();

        run(dir.path(), false).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("docs/index.md")).unwrap(),
            "# Mine\n"
        );
        assert!(!dir.path().join("folio.toml").exists());
    }

    #[test]
    fn yes_overwrites() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/index.md"), "# Mine\n").unwrap();

        run(dir.path(), true).unwrap();

        assert!(fs::read_to_string(dir.path().join("docs/index.md"))
            .unwrap()
            .contains("# Welcome"));
    }
}
