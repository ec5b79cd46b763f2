//! Author identity and commit message for publish commits.

/// Author and committer of publish commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "github-actions[bot]".to_string(),
            email: "41898282+github-actions[bot]@users.noreply.github.com".to_string(),
        }
    }
}

impl Identity {
    /// Environment for `git commit-tree`, author and committer alike.
    pub fn env(&self) -> [(&'static str, &str); 4] {
        [
            ("GIT_AUTHOR_NAME", self.name.as_str()),
            ("GIT_AUTHOR_EMAIL", self.email.as_str()),
            ("GIT_COMMITTER_NAME", self.name.as_str()),
            ("GIT_COMMITTER_EMAIL", self.email.as_str()),
        ]
    }
}

/// `deploy: <sha>`, followed by the triggering change description when there is one.
pub fn commit_message(source_sha: &str, description: Option<&str>) -> String {
    let subject = format!("deploy: {}", source_sha);
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(body) => format!("{}\n\n{}\n", subject, body),
        None => format!("{}\n", subject),
    }
}
