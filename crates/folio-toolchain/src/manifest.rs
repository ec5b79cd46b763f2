//! The dependency manifest (`folio.toolchain.toml`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::digest::content_hash;

/// Default manifest file name.
pub const MANIFEST_FILE: &str = "folio.toolchain.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    toolchain: ToolchainPin,
    #[serde(default)]
    dependencies: BTreeMap<String, RawDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolchainPin {
    folio: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDependency {
    git: Option<String>,
    rev: Option<String>,
    path: Option<PathBuf>,
    sha256: Option<String>,
}

/// Where a dependency comes from. Every variant is pinned to exact content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySource {
    /// A repository at a full commit id
    Git { url: String, rev: String },
    /// A vendored directory whose tree digest must match
    Path { path: PathBuf, sha256: String },
}

/// A named, pinned dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    pub source: DependencySource,
}

/// A loaded and validated manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Exact generator version the site is built with
    pub generator_version: String,
    /// Dependencies in name order
    pub dependencies: Vec<Dependency>,
    /// SHA-256 of the manifest bytes
    pub checksum: String,
}

/// Manifest loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Dependency '{name}': {reason}")]
    InvalidDependency { name: String, reason: String },
}

impl Manifest {
    /// Load a manifest; relative `path` sources resolve against its directory.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let bytes = fs::read(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or(Path::new(""));
        Self::from_bytes(&bytes, base).map_err(|e| match e {
            ManifestError::Parse { message, .. } => ManifestError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse manifest bytes.
    pub fn from_bytes(bytes: &[u8], base_dir: &Path) -> Result<Self, ManifestError> {
        let parse_error = |message: String| ManifestError::Parse {
            path: PathBuf::from(MANIFEST_FILE),
            message,
        };

        let text = std::str::from_utf8(bytes).map_err(|e| parse_error(e.to_string()))?;
        let file: ManifestFile = toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;

        if file.toolchain.folio.trim().is_empty() {
            return Err(parse_error("toolchain.folio must pin a version".to_string()));
        }

        let dependencies = file
            .dependencies
            .into_iter()
            .map(|(name, raw)| validate(name, raw, base_dir))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            generator_version: file.toolchain.folio.trim().to_string(),
            dependencies,
            checksum: content_hash(bytes),
        })
    }

    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.dependencies.iter().find(|d| d.name == name)
    }
}

fn validate(name: String, raw: RawDependency, base_dir: &Path) -> Result<Dependency, ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidDependency {
        name: name.clone(),
        reason: reason.to_string(),
    };

    if !name_pattern().is_match(&name) {
        return Err(invalid(
            "names may only contain letters, digits, '-', '_' and '.'",
        ));
    }

    let source = match raw {
        RawDependency {
            git: Some(url),
            rev,
            path: None,
            sha256: None,
        } => {
            let rev = rev.ok_or_else(|| invalid("git dependencies need a rev"))?;
            if !folio_git::is_commit_id(&rev) {
                return Err(invalid(
                    "rev must be a full 40-character commit id, not a branch or tag",
                ));
            }
            DependencySource::Git { url, rev }
        }
        RawDependency {
            git: None,
            rev: None,
            path: Some(path),
            sha256,
        } => {
            let sha256 = sha256.ok_or_else(|| invalid("path dependencies need a sha256"))?;
            if !sha256_pattern().is_match(&sha256) {
                return Err(invalid("sha256 must be 64 lowercase hex characters"));
            }
            DependencySource::Path {
                path: base_dir.join(path),
                sha256,
            }
        }
        _ => {
            return Err(invalid(
                "expected either `git` + `rev` or `path` + `sha256`",
            ))
        }
    };

    Ok(Dependency { name, source })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]*$").expect("valid pattern"))
}

fn sha256_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9a-f]{64}$").expect("valid pattern"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REV: &str = "0123456789abcdef0123456789abcdef01234567";
    const SHA: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn parse(text: &str) -> Result<Manifest, ManifestError> {
        Manifest::from_bytes(text.as_bytes(), Path::new("/repo"))
    }

    #[test]
    fn parses_pinned_dependencies() {
        let manifest = parse(&format!(
            r#"
[toolchain]
folio = "0.1.0"

[dependencies.classic]
git = "https://github.com/folio-docs/classic.git"
rev = "{REV}"

[dependencies.brand]
path = "vendor/brand"
sha256 = "{SHA}"
"#
        ))
        .unwrap();

        assert_eq!(manifest.generator_version, "0.1.0");
        assert_eq!(
            manifest.dependencies,
            vec![
                Dependency {
                    name: "brand".to_string(),
                    source: DependencySource::Path {
                        path: PathBuf::from("/repo/vendor/brand"),
                        sha256: SHA.to_string(),
                    },
                },
                Dependency {
                    name: "classic".to_string(),
                    source: DependencySource::Git {
                        url: "https://github.com/folio-docs/classic.git".to_string(),
                        rev: REV.to_string(),
                    },
                },
            ]
        );
        assert!(manifest.dependency("classic").is_some());
    }

    #[test]
    fn checksum_follows_bytes() {
        let a = parse("[toolchain]\nfolio = \"0.1.0\"\n").unwrap();
        let b = parse("[toolchain]\nfolio = \"0.1.0\"\n").unwrap();
        let c = parse("[toolchain]\nfolio = \"0.1.0\" # pinned\n").unwrap();

        assert_eq!(a.checksum, b.checksum);
        assert_ne!(a.checksum, c.checksum);
        assert_eq!(a.checksum.len(), 64);
    }

    #[test]
    fn rejects_branch_revs() {
        let err = parse(
            r#"
[toolchain]
folio = "0.1.0"

[dependencies.classic]
git = "https://example.com/classic.git"
rev = "main"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ManifestError::InvalidDependency { .. }));
    }

    #[test]
    fn rejects_mixed_sources() {
        let err = parse(&format!(
            r#"
[toolchain]
folio = "0.1.0"

[dependencies.odd]
git = "https://example.com/odd.git"
rev = "{REV}"
sha256 = "{SHA}"
"#
        ))
        .unwrap_err();

        assert!(matches!(err, ManifestError::InvalidDependency { .. }));
    }

    #[test]
    fn requires_toolchain_pin() {
        assert!(matches!(
            parse("[dependencies]\n"),
            Err(ManifestError::Parse { .. })
        ));
        assert!(matches!(
            parse("[toolchain]\nfolio = \" \"\n"),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_path_traversal_names() {
        let err = parse(&format!(
            "[toolchain]\nfolio = \"0.1.0\"\n\n[dependencies.\"../x\"]\npath = \"x\"\nsha256 = \"{SHA}\"\n"
        ))
        .unwrap_err();

        assert!(matches!(err, ManifestError::InvalidDependency { .. }));
    }
}
