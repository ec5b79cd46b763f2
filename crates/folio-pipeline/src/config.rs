//! Site configuration (`folio.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use folio_git::{Identity, PublishOptions};
use folio_site::{BuildConfig, NavEntry};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "folio.toml";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FolioConfig {
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default)]
    pub docs: DocsSettings,
    #[serde(default)]
    pub build: BuildSettings,
    /// Explicit navigation; derived from the pages when absent
    #[serde(default)]
    pub nav: Option<Vec<NavEntry>>,
    #[serde(default)]
    pub publish: PublishSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSettings {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Custom domain written to `CNAME`
    pub cname: Option<String>,
    /// Name of a toolchain dependency to use as theme
    pub theme: Option<String>,
    /// Extra stylesheets, relative to the config file
    #[serde(default)]
    pub styles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocsSettings {
    #[serde(default = "default_docs_dir")]
    pub dir: String,
    #[serde(default = "default_output")]
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_true")]
    pub minify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishSettings {
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_primary_branch")]
    pub primary_branch: String,
    #[serde(default = "default_true")]
    pub force_orphan: bool,
    #[serde(default)]
    pub allow_empty_commit: bool,
    #[serde(default)]
    pub keep_files: bool,
    #[serde(default = "default_true")]
    pub nojekyll: bool,
    #[serde(default)]
    pub identity: IdentitySettings,
}

/// Overrides for the publishing identity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentitySettings {
    pub name: Option<String>,
    pub email: Option<String>,
}

fn default_title() -> String {
    "Documentation".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}
fn default_docs_dir() -> String {
    "docs".to_string()
}
fn default_output() -> String {
    "site".to_string()
}
fn default_branch() -> String {
    "gh-pages".to_string()
}
fn default_remote() -> String {
    "origin".to_string()
}
fn default_primary_branch() -> String {
    "main".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            base_url: default_base_url(),
            cname: None,
            theme: None,
            styles: vec![],
        }
    }
}

impl Default for DocsSettings {
    fn default() -> Self {
        Self {
            dir: default_docs_dir(),
            output: default_output(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: default_true(),
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            remote: default_remote(),
            primary_branch: default_primary_branch(),
            force_orphan: true,
            allow_empty_commit: false,
            keep_files: false,
            nojekyll: true,
            identity: IdentitySettings::default(),
        }
    }
}

/// Errors loading `folio.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl FolioConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Build settings with paths resolved against `root`.
    pub fn build_config(&self, root: &Path, theme_dir: Option<PathBuf>) -> BuildConfig {
        BuildConfig {
            docs_dir: root.join(&self.docs.dir),
            output_dir: root.join(&self.docs.output),
            minify: self.build.minify,
            base_url: self.site.base_url.clone(),
            title: self.site.title.clone(),
            styles: self.site.styles.iter().map(|s| root.join(s)).collect(),
            cname: self.site.cname.clone(),
            nojekyll: self.publish.nojekyll,
            nav: self.nav.clone(),
            theme_dir,
        }
    }

    pub fn publish_options(&self) -> PublishOptions {
        PublishOptions {
            branch: self.publish.branch.clone(),
            force_orphan: self.publish.force_orphan,
            allow_empty_commit: self.publish.allow_empty_commit,
            keep_files: self.publish.keep_files,
        }
    }

    /// The publishing identity, with configured overrides applied.
    pub fn identity(&self) -> Identity {
        let defaults = Identity::default();
        let overrides = &self.publish.identity;
        Identity {
            name: overrides.name.clone().unwrap_or(defaults.name),
            email: overrides.email.clone().unwrap_or(defaults.email),
        }
    }
}
