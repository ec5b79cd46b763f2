//! The branch-update event that starts a deployment.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// A push to a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Full ref name, e.g. `refs/heads/main`
    pub git_ref: String,
    /// Commit the ref was updated to
    pub sha: String,
    /// Description of the triggering change
    pub message: Option<String>,
    /// Clone URL of the repository, when the environment provides one
    pub repository: Option<String>,
}

/// Events that must not start a deployment.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("{0} is not set")]
    MissingVariable(&'static str),

    #[error("only push events trigger a deploy, got '{0}'")]
    NotAPush(String),

    #[error("not a full commit id: {0}")]
    InvalidSha(String),

    #[error("{0} is not a branch")]
    NotABranch(String),

    #[error("push to '{branch}' ignored; only '{primary}' is published")]
    WrongBranch { branch: String, primary: String },

    #[error("Failed to read event payload {}: {message}", path.display())]
    Payload { path: PathBuf, message: String },
}

#[derive(Debug, Default, Deserialize)]
struct PushPayload {
    #[serde(default)]
    head_commit: Option<HeadCommit>,
    #[serde(default)]
    repository: Option<RepositoryInfo>,
}

#[derive(Debug, Deserialize)]
struct HeadCommit {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryInfo {
    #[serde(default)]
    clone_url: Option<String>,
}

impl TriggerEvent {
    pub fn new(git_ref: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            git_ref: git_ref.into(),
            sha: sha.into(),
            message: None,
            repository: None,
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Read the event from the CI environment.
    pub fn from_env() -> Result<Self, TriggerError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Read the event through `var`, using the GitHub Actions variable names.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, TriggerError> {
        if let Some(name) = var("GITHUB_EVENT_NAME") {
            if name != "push" {
                return Err(TriggerError::NotAPush(name));
            }
        }

        let git_ref = var("GITHUB_REF").ok_or(TriggerError::MissingVariable("GITHUB_REF"))?;
        let sha = var("GITHUB_SHA").ok_or(TriggerError::MissingVariable("GITHUB_SHA"))?;

        let payload = match var("GITHUB_EVENT_PATH") {
            Some(path) => read_payload(Path::new(&path))?,
            None => PushPayload::default(),
        };

        let repository = payload
            .repository
            .and_then(|r| r.clone_url)
            .or_else(|| {
                let server = var("GITHUB_SERVER_URL")?;
                let repo = var("GITHUB_REPOSITORY")?;
                Some(format!("{}/{}.git", server.trim_end_matches('/'), repo))
            });

        Ok(Self {
            git_ref,
            sha,
            message: payload.head_commit.and_then(|c| c.message),
            repository,
        })
    }

    /// Branch name, if the ref is a branch.
    pub fn branch(&self) -> Option<&str> {
        self.git_ref.strip_prefix("refs/heads/")
    }

    /// Accept only pushes of a full commit id to `primary_branch`.
    pub fn accept(&self, primary_branch: &str) -> Result<(), TriggerError> {
        if !folio_git::is_commit_id(&self.sha) {
            return Err(TriggerError::InvalidSha(self.sha.clone()));
        }

        let branch = self
            .branch()
            .ok_or_else(|| TriggerError::NotABranch(self.git_ref.clone()))?;

        if branch != primary_branch {
            return Err(TriggerError::WrongBranch {
                branch: branch.to_string(),
                primary: primary_branch.to_string(),
            });
        }

        Ok(())
    }
}

fn read_payload(path: &Path) -> Result<PushPayload, TriggerError> {
    let payload_error = |message: String| TriggerError::Payload {
        path: path.to_path_buf(),
        message,
    };
    let content = fs::read_to_string(path).map_err(|e| payload_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| payload_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn reads_github_push_event() {
        let dir = tempdir().unwrap();
        let payload = dir.path().join("event.json");
        fs::write(
            &payload,
            r#"{
                "ref": "refs/heads/main",
                "head_commit": { "id": "x", "message": "Add roadmap page" },
                "repository": { "clone_url": "https://github.com/acme/roadmap.git" }
            }"#,
        )
        .unwrap();
        let payload_path = payload.to_string_lossy().to_string();

        let event = TriggerEvent::from_vars(vars(&[
            ("GITHUB_EVENT_NAME", "push"),
            ("GITHUB_REF", "refs/heads/main"),
            ("GITHUB_SHA", SHA),
            ("GITHUB_EVENT_PATH", payload_path.as_str()),
        ]))
        .unwrap();

        assert_eq!(
            event,
            TriggerEvent {
                git_ref: "refs/heads/main".to_string(),
                sha: SHA.to_string(),
                message: Some("Add roadmap page".to_string()),
                repository: Some("https://github.com/acme/roadmap.git".to_string()),
            }
        );
        assert!(event.accept("main").is_ok());
    }

    #[test]
    fn repository_falls_back_to_server_and_name() {
        let event = TriggerEvent::from_vars(vars(&[
            ("GITHUB_REF", "refs/heads/main"),
            ("GITHUB_SHA", SHA),
            ("GITHUB_SERVER_URL", "https://github.com/"),
            ("GITHUB_REPOSITORY", "acme/roadmap"),
        ]))
        .unwrap();

        assert_eq!(
            event.repository.as_deref(),
            Some("https://github.com/acme/roadmap.git")
        );
        assert_eq!(event.message, None);
    }

    #[test]
    fn rejects_other_event_kinds() {
        let err = TriggerEvent::from_vars(vars(&[
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_REF", "refs/pull/1/merge"),
            ("GITHUB_SHA", SHA),
        ]))
        .unwrap_err();

        assert!(matches!(err, TriggerError::NotAPush(name) if name == "pull_request"));
    }

    #[test]
    fn missing_variables_are_reported() {
        let err = TriggerEvent::from_vars(vars(&[("GITHUB_REF", "refs/heads/main")])).unwrap_err();

        assert!(matches!(err, TriggerError::MissingVariable("GITHUB_SHA")));
    }

    #[test]
    fn accepts_only_primary_branch() {
        assert!(matches!(
            TriggerEvent::new("refs/heads/feature", SHA).accept("main"),
            Err(TriggerError::WrongBranch { .. })
        ));
        assert!(matches!(
            TriggerEvent::new("refs/tags/v1", SHA).accept("main"),
            Err(TriggerError::NotABranch(_))
        ));
        assert!(matches!(
            TriggerEvent::new("refs/heads/main", "main").accept("main"),
            Err(TriggerError::InvalidSha(_))
        ));
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let dir = tempdir().unwrap();
        let payload = dir.path().join("event.json");
        fs::write(&payload, "{ not json").unwrap();
        let payload_path = payload.to_string_lossy().to_string();

        let err = TriggerEvent::from_vars(vars(&[
            ("GITHUB_REF", "refs/heads/main"),
            ("GITHUB_SHA", SHA),
            ("GITHUB_EVENT_PATH", payload_path.as_str()),
        ]))
        .unwrap_err();

        assert!(matches!(err, TriggerError::Payload { .. }));
    }
}
