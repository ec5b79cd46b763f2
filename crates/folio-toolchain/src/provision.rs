//! Materializing a manifest into a cached, isolated environment.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use folio_git::{checkout, CheckoutError, CheckoutRequest, Token};

use crate::digest::tree_digest;
use crate::manifest::{Dependency, DependencySource, Manifest};

/// Marker written last; an environment without it is incomplete.
const COMPLETE_MARKER: &str = ".folio-complete";

/// A provisioned environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// `<cache>/<checksum>`
    pub root: PathBuf,
    pub checksum: String,
    /// Whether an existing environment was reused
    pub reused: bool,
}

impl Environment {
    /// Directory holding the named dependency.
    pub fn dependency_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Provisioning errors. None of them fall back to another environment.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("manifest pins folio {pinned} but this is folio {running}")]
    VersionMismatch { pinned: String, running: String },

    #[error("dependency '{name}': source directory not found: {}", path.display())]
    MissingSource { name: String, path: PathBuf },

    #[error("dependency '{name}': digest mismatch, expected {expected}, found {actual}")]
    DigestMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("dependency '{name}': {source}")]
    Fetch {
        name: String,
        #[source]
        source: CheckoutError,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

fn io_error(context: impl Into<String>) -> impl FnOnce(io::Error) -> ProvisionError {
    let context = context.into();
    move |source| ProvisionError::Io { context, source }
}

/// Installs manifests under a cache directory.
#[derive(Debug, Clone)]
pub struct Provisioner {
    cache_dir: PathBuf,
    generator_version: String,
    token: Option<Token>,
}

impl Provisioner {
    /// `generator_version` is the version of the running generator; manifests must
    /// pin exactly this version.
    pub fn new(cache_dir: impl Into<PathBuf>, generator_version: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            generator_version: generator_version.into(),
            token: None,
        }
    }

    /// Credential for fetching git dependencies over https.
    pub fn with_token(mut self, token: Option<Token>) -> Self {
        self.token = token;
        self
    }

    /// Provision `manifest`, reusing a complete environment with the same checksum.
    pub fn provision(&self, manifest: &Manifest) -> Result<Environment, ProvisionError> {
        if manifest.generator_version != self.generator_version {
            return Err(ProvisionError::VersionMismatch {
                pinned: manifest.generator_version.clone(),
                running: self.generator_version.clone(),
            });
        }

        let root = self.cache_dir.join(&manifest.checksum);
        if root.join(COMPLETE_MARKER).is_file() {
            tracing::info!(
                "Reusing toolchain environment {}",
                short(&manifest.checksum)
            );
            return Ok(Environment {
                root,
                checksum: manifest.checksum.clone(),
                reused: true,
            });
        }

        if root.exists() {
            tracing::warn!("Removing incomplete environment {}", root.display());
            fs::remove_dir_all(&root).map_err(io_error(format!("removing {}", root.display())))?;
        }

        fs::create_dir_all(&self.cache_dir)
            .map_err(io_error(format!("creating {}", self.cache_dir.display())))?;

        let scratch = self.cache_dir.join(format!(
            ".{}.partial-{}",
            manifest.checksum,
            std::process::id()
        ));
        if scratch.exists() {
            fs::remove_dir_all(&scratch)
                .map_err(io_error(format!("removing {}", scratch.display())))?;
        }
        fs::create_dir_all(&scratch).map_err(io_error(format!("creating {}", scratch.display())))?;

        if let Err(e) = self.populate(&scratch, manifest) {
            let _ = fs::remove_dir_all(&scratch);
            return Err(e);
        }

        match fs::rename(&scratch, &root) {
            Ok(()) => {}
            Err(_) if root.join(COMPLETE_MARKER).is_file() => {
                // Another run finished the same checksum first.
                let _ = fs::remove_dir_all(&scratch);
            }
            Err(e) => {
                let _ = fs::remove_dir_all(&scratch);
                return Err(io_error(format!("moving environment to {}", root.display()))(e));
            }
        }

        tracing::info!(
            "Provisioned {} dependencies into {}",
            manifest.dependencies.len(),
            root.display()
        );

        Ok(Environment {
            root,
            checksum: manifest.checksum.clone(),
            reused: false,
        })
    }

    fn populate(&self, scratch: &Path, manifest: &Manifest) -> Result<(), ProvisionError> {
        for dependency in &manifest.dependencies {
            self.install(scratch, dependency)?;
        }

        let listing: Vec<String> = std::iter::once(manifest.checksum.clone())
            .chain(manifest.dependencies.iter().map(|d| d.name.clone()))
            .collect();
        fs::write(scratch.join(COMPLETE_MARKER), listing.join("\n") + "\n")
            .map_err(io_error("writing completion marker"))
    }

    fn install(&self, scratch: &Path, dependency: &Dependency) -> Result<(), ProvisionError> {
        let dest = scratch.join(&dependency.name);

        match &dependency.source {
            DependencySource::Git { url, rev } => {
                tracing::info!("Fetching {} at {}", dependency.name, short(rev));
                checkout(&CheckoutRequest {
                    remote: url,
                    commit: rev,
                    dest: &dest,
                    token: self.token.as_ref(),
                })
                .map_err(|source| ProvisionError::Fetch {
                    name: dependency.name.clone(),
                    source,
                })?;
                let git_dir = dest.join(".git");
                fs::remove_dir_all(&git_dir)
                    .map_err(io_error(format!("removing {}", git_dir.display())))?;
            }
            DependencySource::Path { path, sha256 } => {
                if !path.is_dir() {
                    return Err(ProvisionError::MissingSource {
                        name: dependency.name.clone(),
                        path: path.clone(),
                    });
                }
                let actual =
                    tree_digest(path).map_err(io_error(format!("hashing {}", path.display())))?;
                if &actual != sha256 {
                    return Err(ProvisionError::DigestMismatch {
                        name: dependency.name.clone(),
                        expected: sha256.clone(),
                        actual,
                    });
                }
                tracing::info!("Copying {} from {}", dependency.name, path.display());
                copy_dir(path, &dest).map_err(io_error(format!("copying {}", path.display())))?;
            }
        }

        Ok(())
    }
}

fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn short(id: &str) -> &str {
    &id[..id.len().min(12)]
}
