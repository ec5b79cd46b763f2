//! Publishing a directory as the sole content of a branch.
//!
//! The tree is staged through a throwaway index file with the site directory as work
//! tree, so the local repository only gains objects. The remote is mutated by exactly
//! one force-push; if that push fails the previously published branch is untouched.

use std::fs;
use std::path::{Path, PathBuf};

use crate::identity::Identity;
use crate::runner::{authenticated_url, Git, GitError, Token};

/// Publication policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    /// Branch that holds the published site
    pub branch: String,
    /// Publish commits have no parent, so the branch always holds one commit
    pub force_orphan: bool,
    /// Commit even when the tree equals the published one
    pub allow_empty_commit: bool,
    /// Retain published files that the new output no longer contains
    pub keep_files: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            branch: "gh-pages".to_string(),
            force_orphan: true,
            allow_empty_commit: false,
            keep_files: false,
        }
    }
}

/// Inputs for one publication.
#[derive(Debug, Clone)]
pub struct PublishRequest<'a> {
    /// Any local repository; used as the object store for the new commit
    pub repo_dir: &'a Path,
    /// Remote URL or path to push to
    pub remote: &'a str,
    /// Generated site to publish verbatim
    pub site_dir: &'a Path,
    pub identity: &'a Identity,
    pub message: &'a str,
    pub token: Option<&'a Token>,
    pub options: &'a PublishOptions,
}

/// What a publication did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new commit is now the branch tip
    Published { commit: String, tree: String },
    /// The remote already holds this exact tree; nothing was pushed
    Unchanged { tree: String },
}

/// Errors from publication. The remote branch is unchanged after any of them.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("site directory is missing or empty: {}", .0.display())]
    EmptySite(PathBuf),

    #[error("not a git repository: {}: {source}", path.display())]
    NotARepository {
        path: PathBuf,
        #[source]
        source: GitError,
    },

    #[error("cannot read {branch} from remote: {source}")]
    RemoteState {
        branch: String,
        #[source]
        source: GitError,
    },

    #[error("failed to stage site tree: {0}")]
    Stage(#[source] GitError),

    #[error("failed to create publish commit: {0}")]
    Commit(#[source] GitError),

    #[error("push to {branch} was rejected: {source}")]
    PushRejected {
        branch: String,
        #[source]
        source: GitError,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// The remote branch tip before publication.
#[derive(Debug)]
struct PublishedTip {
    commit: String,
    tree: String,
}

/// Replace the remote branch with the contents of `request.site_dir`.
pub fn publish(request: &PublishRequest<'_>) -> Result<PublishOutcome, PublishError> {
    ensure_site(request.site_dir)?;
    // The staging git runs with the site as both cwd and work tree.
    let site_dir = std::path::absolute(request.site_dir).map_err(|source| PublishError::Io {
        context: format!("resolving {}", request.site_dir.display()),
        source,
    })?;

    let options = request.options;
    let repo = Git::new(request.repo_dir).redacting(request.token);
    let git_dir = repo
        .run(&["rev-parse", "--absolute-git-dir"])
        .map_err(|source| PublishError::NotARepository {
            path: request.repo_dir.to_path_buf(),
            source,
        })?;

    let url = authenticated_url(request.remote, request.token);
    let branch_ref = format!("refs/heads/{}", options.branch);
    let tracking_ref = format!("refs/folio/{}", options.branch);

    let previous = remote_tip(&repo, &url, &branch_ref, &tracking_ref).map_err(|source| {
        PublishError::RemoteState {
            branch: options.branch.clone(),
            source,
        }
    })?;

    let tree = stage_tree(request, &site_dir, &git_dir, previous.as_ref())?;

    if let Some(prev) = &previous {
        if prev.tree == tree && !options.allow_empty_commit {
            tracing::info!(
                "Published tree {} is unchanged; skipping commit to {}",
                tree,
                options.branch
            );
            return Ok(PublishOutcome::Unchanged { tree });
        }
    }

    let mut commit_args = vec!["commit-tree", tree.as_str()];
    if !options.force_orphan {
        if let Some(prev) = &previous {
            commit_args.extend(["-p", prev.commit.as_str()]);
        }
    }

    let committer = request
        .identity
        .env()
        .into_iter()
        .fold(repo.clone(), |git, (key, value)| git.with_env(key, value));
    let commit = committer
        .run_with_stdin(&commit_args, request.message)
        .map_err(PublishError::Commit)?;

    repo.run(&[
        "push",
        "--quiet",
        "--force",
        &url,
        &format!("{}:{}", commit, branch_ref),
    ])
    .map_err(|source| PublishError::PushRejected {
        branch: options.branch.clone(),
        source,
    })?;

    if let Err(e) = repo.run(&["update-ref", &tracking_ref, &commit]) {
        tracing::warn!("Pushed {} but could not update {}: {}", commit, tracking_ref, e);
    }

    tracing::info!(
        "Published {} (tree {}) to {}",
        commit,
        tree,
        options.branch
    );

    Ok(PublishOutcome::Published { commit, tree })
}

fn ensure_site(site_dir: &Path) -> Result<(), PublishError> {
    if !site_dir.is_dir() {
        return Err(PublishError::EmptySite(site_dir.to_path_buf()));
    }
    let mut entries = fs::read_dir(site_dir).map_err(|source| PublishError::Io {
        context: format!("reading {}", site_dir.display()),
        source,
    })?;
    if entries.next().is_none() {
        return Err(PublishError::EmptySite(site_dir.to_path_buf()));
    }
    Ok(())
}

/// Fetch the current remote tip into `tracking_ref`, if the branch exists.
fn remote_tip(
    repo: &Git,
    url: &str,
    branch_ref: &str,
    tracking_ref: &str,
) -> Result<Option<PublishedTip>, GitError> {
    let listing = repo.run(&["ls-remote", url, branch_ref])?;
    let Some(commit) = listing
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .find(|(_, name)| *name == branch_ref)
        .map(|(sha, _)| sha.to_string())
    else {
        tracing::info!("Remote has no {}; this will be the first publish", branch_ref);
        return Ok(None);
    };

    repo.run(&[
        "fetch",
        "--quiet",
        "--no-tags",
        "--depth=1",
        url,
        &format!("+{}:{}", branch_ref, tracking_ref),
    ])?;
    let tree = repo.run(&["rev-parse", &format!("{}^{{tree}}", commit)])?;

    tracing::debug!("Remote {} is at {} (tree {})", branch_ref, commit, tree);

    Ok(Some(PublishedTip { commit, tree }))
}

/// Write the site directory as a tree object using a private index.
fn stage_tree(
    request: &PublishRequest<'_>,
    site_dir: &Path,
    git_dir: &str,
    previous: Option<&PublishedTip>,
) -> Result<String, PublishError> {
    let scratch = tempfile::tempdir().map_err(|source| PublishError::Io {
        context: "creating scratch index directory".to_string(),
        source,
    })?;

    let staging = Git::new(site_dir)
        .with_git_dir(git_dir)
        .with_work_tree(site_dir)
        .with_env("GIT_INDEX_FILE", scratch.path().join("index"))
        .redacting(request.token);

    match (request.options.keep_files, previous) {
        (true, Some(prev)) => {
            staging
                .run(&["read-tree", &prev.tree])
                .map_err(PublishError::Stage)?;
            staging
                .run(&["add", "--force", "--ignore-removal", "."])
                .map_err(PublishError::Stage)?;
        }
        _ => {
            staging
                .run(&["add", "--all", "--force", "."])
                .map_err(PublishError::Stage)?;
        }
    }

    staging.run(&["write-tree"]).map_err(PublishError::Stage)
}
