//! Materializing an exact commit into a fresh directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::{authenticated_url, is_commit_id, Git, GitError, Token};

/// What to check out and where.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    /// Remote URL or local repository path
    pub remote: &'a str,
    /// Full commit id to materialize
    pub commit: &'a str,
    /// Destination; must be absent or empty
    pub dest: &'a Path,
    pub token: Option<&'a Token>,
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    pub dir: PathBuf,
    pub commit: String,
}

/// Errors from checkout. All are fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("not a full commit id: {0}")]
    InvalidCommit(String),

    #[error("checkout destination is not empty: {}", .0.display())]
    DestinationNotEmpty(PathBuf),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot resolve {reference}: {source}")]
    Unresolved {
        reference: String,
        #[source]
        source: GitError,
    },

    #[error("cannot resolve {reference} on {remote}")]
    UnknownRef { remote: String, reference: String },

    #[error("checked out {actual} but expected {expected}")]
    Mismatch { expected: String, actual: String },
}

/// Resolve a branch or ref on a remote to its current commit id.
///
/// `reference` may be a full ref (`refs/heads/main`) or a branch name.
pub fn resolve_remote_ref(
    remote: &str,
    reference: &str,
    token: Option<&Token>,
) -> Result<String, CheckoutError> {
    let full_ref = if reference.starts_with("refs/") {
        reference.to_string()
    } else {
        format!("refs/heads/{}", reference)
    };

    let git = Git::new(".").redacting(token);
    let listing = git
        .run(&["ls-remote", &authenticated_url(remote, token), &full_ref])
        .map_err(|source| CheckoutError::Unresolved {
            reference: full_ref.clone(),
            source,
        })?;

    listing
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .find(|(_, name)| *name == full_ref)
        .map(|(sha, _)| sha.to_string())
        .ok_or_else(|| CheckoutError::UnknownRef {
            remote: git.redact(remote),
            reference: full_ref,
        })
}

/// Fetch exactly `request.commit` into `request.dest` and check it out detached.
///
/// On any failure the destination is removed; there is no partial checkout.
pub fn checkout(request: &CheckoutRequest<'_>) -> Result<Checkout, CheckoutError> {
    if !is_commit_id(request.commit) {
        return Err(CheckoutError::InvalidCommit(request.commit.to_string()));
    }

    if request.dest.exists() {
        let mut entries = fs::read_dir(request.dest).map_err(|source| CheckoutError::Io {
            context: format!("reading {}", request.dest.display()),
            source,
        })?;
        if entries.next().is_some() {
            return Err(CheckoutError::DestinationNotEmpty(request.dest.to_path_buf()));
        }
    }

    fs::create_dir_all(request.dest).map_err(|source| CheckoutError::Io {
        context: format!("creating {}", request.dest.display()),
        source,
    })?;

    match fetch_and_checkout(request) {
        Ok(checkout) => Ok(checkout),
        Err(e) => {
            let _ = fs::remove_dir_all(request.dest);
            Err(e)
        }
    }
}

fn fetch_and_checkout(request: &CheckoutRequest<'_>) -> Result<Checkout, CheckoutError> {
    let git = Git::new(request.dest).redacting(request.token);
    let unresolved = |source: GitError| CheckoutError::Unresolved {
        reference: request.commit.to_string(),
        source,
    };

    git.run(&["init", "--quiet"]).map_err(unresolved)?;
    git.run(&[
        "fetch",
        "--quiet",
        "--no-tags",
        "--depth=1",
        &authenticated_url(request.remote, request.token),
        request.commit,
    ])
    .map_err(unresolved)?;
    git.run(&["checkout", "--quiet", "--detach", "FETCH_HEAD"])
        .map_err(unresolved)?;

    let head = git.run(&["rev-parse", "HEAD"]).map_err(unresolved)?;
    if head != request.commit {
        return Err(CheckoutError::Mismatch {
            expected: request.commit.to_string(),
            actual: head,
        });
    }

    tracing::info!("Checked out {} into {}", head, request.dest.display());

    Ok(Checkout {
        dir: request.dest.to_path_buf(),
        commit: head,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{git_available, SourceRepo};
    use tempfile::tempdir;

    #[test]
    fn rejects_short_commit_ids() {
        let temp = tempdir().unwrap();

        let err = checkout(&CheckoutRequest {
            remote: "/nowhere",
            commit: "abc123",
            dest: &temp.path().join("co"),
            token: None,
        })
        .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidCommit(_)));
    }

    #[test]
    fn materializes_exact_commit() {
        if !git_available() {
            return;
        }
        let repo = SourceRepo::new();
        let first = repo.commit(&[("docs/index.md", "# One\n")], "first");
        repo.commit(&[("docs/index.md", "# Two\n")], "second");
        let dest = repo.scratch().join("checkout");

        let co = checkout(&CheckoutRequest {
            remote: repo.url(),
            commit: &first,
            dest: &dest,
            token: None,
        })
        .unwrap();

        assert_eq!(co.commit, first);
        assert_eq!(
            fs::read_to_string(dest.join("docs/index.md")).unwrap(),
            "# One\n"
        );
    }

    #[test]
    fn unknown_commit_is_fatal_and_cleans_up() {
        if !git_available() {
            return;
        }
        let repo = SourceRepo::new();
        repo.commit(&[("docs/index.md", "# One\n")], "first");
        let dest = repo.scratch().join("checkout");

        let err = checkout(&CheckoutRequest {
            remote: repo.url(),
            commit: "0000000000000000000000000000000000000001",
            dest: &dest,
            token: None,
        })
        .unwrap_err();

        assert!(matches!(err, CheckoutError::Unresolved { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn refuses_non_empty_destination() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("stale"), "x").unwrap();

        let err = checkout(&CheckoutRequest {
            remote: "/nowhere",
            commit: "0123456789abcdef0123456789abcdef01234567",
            dest: temp.path(),
            token: None,
        })
        .unwrap_err();

        assert!(matches!(err, CheckoutError::DestinationNotEmpty(_)));
        assert!(temp.path().join("stale").exists());
    }

    #[test]
    fn resolves_branch_tip() {
        if !git_available() {
            return;
        }
        let repo = SourceRepo::new();
        let tip = repo.commit(&[("a.md", "a")], "first");

        assert_eq!(resolve_remote_ref(repo.url(), "main", None).unwrap(), tip);
        assert_eq!(
            resolve_remote_ref(repo.url(), "refs/heads/main", None).unwrap(),
            tip
        );
        assert!(matches!(
            resolve_remote_ref(repo.url(), "nope", None),
            Err(CheckoutError::UnknownRef { .. })
        ));
    }
}
