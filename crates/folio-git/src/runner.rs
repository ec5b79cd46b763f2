//! Running `git` subcommands.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;

use regex::Regex;

/// An opaque credential. Never printed.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Errors from invoking git.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("git {command} produced non-UTF-8 output")]
    Encoding { command: String },
}

/// A configured git invocation context.
///
/// Every command runs with terminal prompts disabled and a fixed locale. Secrets
/// registered with [`Git::redacting`] are masked in all error messages.
#[derive(Debug, Clone)]
pub struct Git {
    cwd: PathBuf,
    git_dir: Option<PathBuf>,
    work_tree: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    secrets: Vec<String>,
}

impl Git {
    /// Run commands from `cwd`.
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            git_dir: None,
            work_tree: None,
            envs: Vec::new(),
            secrets: Vec::new(),
        }
    }

    /// Use an explicit repository directory (`--git-dir`).
    pub fn with_git_dir(mut self, git_dir: impl Into<PathBuf>) -> Self {
        self.git_dir = Some(git_dir.into());
        self
    }

    /// Use an explicit work tree (`--work-tree`).
    pub fn with_work_tree(mut self, work_tree: impl Into<PathBuf>) -> Self {
        self.work_tree = Some(work_tree.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Mask `token` in every error produced by this context.
    pub fn redacting(mut self, token: Option<&Token>) -> Self {
        if let Some(token) = token {
            if !token.expose().is_empty() {
                self.secrets.push(token.expose().to_string());
            }
        }
        self
    }

    /// Run a subcommand and return trimmed stdout.
    pub fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args, None)?;
        self.check(args, &output)?;
        self.stdout(args, output)
    }

    /// Run a subcommand feeding `stdin`, returning trimmed stdout.
    pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Result<String, GitError> {
        let output = self.output(args, Some(stdin))?;
        self.check(args, &output)?;
        self.stdout(args, output)
    }

    /// Run a subcommand, returning `None` instead of an error on a non-zero exit.
    pub fn try_run(&self, args: &[&str]) -> Result<Option<String>, GitError> {
        let output = self.output(args, None)?;
        if !output.status.success() {
            tracing::debug!(
                "git {} failed: {}",
                self.describe(args),
                self.redact(String::from_utf8_lossy(&output.stderr).trim())
            );
            return Ok(None);
        }
        self.stdout(args, output).map(Some)
    }

    fn output(&self, args: &[&str], stdin: Option<&str>) -> Result<Output, GitError> {
        let mut command = Command::new("git");
        if let Some(git_dir) = &self.git_dir {
            command.arg("--git-dir").arg(git_dir);
        }
        if let Some(work_tree) = &self.work_tree {
            command.arg("--work-tree").arg(work_tree);
        }
        command
            .args(args)
            .current_dir(&self.cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!("git {}", self.describe(args));

        match stdin {
            None => command
                .stdin(Stdio::null())
                .output()
                .map_err(GitError::Spawn),
            Some(input) => {
                use std::io::Write;

                command.stdin(Stdio::piped());
                let mut child = command.spawn().map_err(GitError::Spawn)?;
                if let Some(mut pipe) = child.stdin.take() {
                    pipe.write_all(input.as_bytes()).map_err(GitError::Spawn)?;
                }
                child.wait_with_output().map_err(GitError::Spawn)
            }
        }
    }

    fn check(&self, args: &[&str], output: &Output) -> Result<(), GitError> {
        if output.status.success() {
            return Ok(());
        }
        Err(GitError::Failed {
            command: self.describe(args),
            status: output.status.to_string(),
            stderr: self.redact(String::from_utf8_lossy(&output.stderr).trim()),
        })
    }

    fn stdout(&self, args: &[&str], output: Output) -> Result<String, GitError> {
        String::from_utf8(output.stdout)
            .map(|s| s.trim().to_string())
            .map_err(|_| GitError::Encoding {
                command: self.describe(args),
            })
    }

    fn describe(&self, args: &[&str]) -> String {
        self.redact(&args.join(" "))
    }

    /// Replace every registered secret in `text`.
    pub fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), "***"))
    }
}

/// Whether `value` is a full 40-character hex commit id.
pub fn is_commit_id(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9a-f]{40}$").expect("commit id pattern is valid"))
        .is_match(value)
}

/// Embed `token` into an https remote URL as `x-access-token`.
///
/// Other remotes (ssh, local paths) are returned unchanged; any existing user info in
/// an https URL is replaced.
pub fn authenticated_url(remote: &str, token: Option<&Token>) -> String {
    let Some(token) = token else {
        return remote.to_string();
    };
    let Some(rest) = remote.strip_prefix("https://") else {
        return remote.to_string();
    };

    let host_and_path = match rest.find('/') {
        Some(slash) => {
            let (authority, path) = rest.split_at(slash);
            let host = authority.rsplit('@').next().unwrap_or(authority);
            format!("{}{}", host, path)
        }
        None => rest.rsplit('@').next().unwrap_or(rest).to_string(),
    };

    format!("https://x-access-token:{}@{}", token.expose(), host_and_path)
}
