//! Scratch repositories for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::runner::Git;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn author(git: Git) -> Git {
    git.with_env("GIT_AUTHOR_NAME", "Test")
        .with_env("GIT_AUTHOR_EMAIL", "test@example.com")
        .with_env("GIT_COMMITTER_NAME", "Test")
        .with_env("GIT_COMMITTER_EMAIL", "test@example.com")
}

/// A non-bare repository on branch `main` plus a scratch area.
pub struct SourceRepo {
    temp: TempDir,
    path: PathBuf,
    url: String,
}

impl SourceRepo {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("source");
        fs::create_dir_all(&path).unwrap();

        let git = Git::new(&path);
        git.run(&["init", "--quiet"]).unwrap();
        git.run(&["symbolic-ref", "HEAD", "refs/heads/main"]).unwrap();
        git.run(&["config", "uploadpack.allowAnySHA1InWant", "true"])
            .unwrap();

        let url = path.to_string_lossy().to_string();
        Self { temp, path, url }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// A directory outside the repository for checkouts and remotes.
    pub fn scratch(&self) -> PathBuf {
        self.temp.path().to_path_buf()
    }

    /// Write `files` and commit them, returning the new commit id.
    pub fn commit(&self, files: &[(&str, &str)], message: &str) -> String {
        for (name, content) in files {
            let target = self.path.join(name);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, content).unwrap();
        }

        let git = author(Git::new(&self.path));
        git.run(&["add", "--all"]).unwrap();
        git.run(&["commit", "--quiet", "--allow-empty", "-m", message])
            .unwrap();
        git.run(&["rev-parse", "HEAD"]).unwrap()
    }
}

/// A bare repository standing in for the hosting remote.
pub struct BareRemote {
    _temp: TempDir,
    path: PathBuf,
    url: String,
}

impl BareRemote {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("remote.git");
        fs::create_dir_all(&path).unwrap();
        Git::new(&path)
            .run(&["init", "--quiet", "--bare"])
            .unwrap();

        let url = path.to_string_lossy().to_string();
        Self {
            _temp: temp,
            path,
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn git(&self) -> Git {
        Git::new(&self.path)
    }

    pub fn branch_tip(&self, branch: &str) -> Option<String> {
        self.git()
            .try_run(&["rev-parse", "--verify", "--quiet", &format!("refs/heads/{}", branch)])
            .unwrap()
    }

    /// Number of commits reachable from the branch.
    pub fn commit_count(&self, branch: &str) -> usize {
        self.git()
            .run(&["rev-list", "--count", &format!("refs/heads/{}", branch)])
            .unwrap()
            .parse()
            .unwrap()
    }

    /// Sorted file list of the branch tip.
    pub fn files(&self, branch: &str) -> Vec<String> {
        let listing = self
            .git()
            .run(&["ls-tree", "-r", "--name-only", &format!("refs/heads/{}", branch)])
            .unwrap();
        let mut files: Vec<String> = listing.lines().map(str::to_string).collect();
        files.sort();
        files
    }

    pub fn show(&self, branch: &str, path: &str) -> String {
        self.git()
            .run(&["show", &format!("refs/heads/{}:{}", branch, path)])
            .unwrap()
    }

    pub fn log_format(&self, branch: &str, format: &str) -> String {
        self.git()
            .run(&["log", "-1", &format!("--format={}", format), &format!("refs/heads/{}", branch)])
            .unwrap()
    }

    pub fn forbid_pushes(&self) {
        let hook = self.path.join("hooks").join("pre-receive");
        fs::create_dir_all(hook.parent().unwrap()).unwrap();
        fs::write(&hook, "#!/bin/sh\necho 'branch is protected' >&2\nexit 1\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&hook, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }
}
