//! Publish an already built site.

use std::path::PathBuf;

use anyhow::{Context, Result};
use folio_git::{commit_message, publish, Git, PublishOutcome, PublishRequest, Token};
use folio_pipeline::PipelineError;

use super::{remote_url, Project};

/// Run the publish command from the repository containing the config file.
pub fn run(
    project: &Project,
    dir: Option<PathBuf>,
    remote: Option<String>,
    message: Option<String>,
    token: Option<Token>,
) -> Result<()> {
    let root = project.root();
    let config = project.load_config()?;

    let site_dir = dir.unwrap_or_else(|| root.join(&config.docs.output));
    let remote = remote_url(
        &root,
        remote.as_deref().unwrap_or(&config.publish.remote),
    );
    let source_sha = Git::new(&root)
        .run(&["rev-parse", "HEAD"])
        .context("Cannot determine the source commit")?;

    let identity = config.identity();
    let message = commit_message(&source_sha, message.as_deref());
    let options = config.publish_options();

    let outcome = publish(&PublishRequest {
        repo_dir: &root,
        remote: &remote,
        site_dir: &site_dir,
        identity: &identity,
        message: &message,
        token: token.as_ref(),
        options: &options,
    })
    .map_err(PipelineError::from)?;

    match outcome {
        PublishOutcome::Published { commit, .. } => {
            tracing::info!("{} now at {}", options.branch, commit);
        }
        PublishOutcome::Unchanged { .. } => {
            tracing::info!("{} already up to date", options.branch);
        }
    }

    Ok(())
}
