//! Full pipeline for a push event.

use std::path::PathBuf;

use anyhow::Result;
use folio_git::{resolve_remote_ref, PublishOutcome, Token};
use folio_pipeline::{deploy, Deployment, PipelineError, TriggerEvent};

use super::{remote_url, Project};

/// Event fields given on the command line.
pub struct EventArgs {
    pub git_ref: Option<String>,
    pub sha: Option<String>,
    pub message: Option<String>,
}

/// An event for the current tip of `git_ref` on `remote`.
fn event_at_tip(
    remote: &str,
    git_ref: &str,
    token: Option<&Token>,
) -> Result<TriggerEvent, PipelineError> {
    let full_ref = if git_ref.starts_with("refs/") {
        git_ref.to_string()
    } else {
        format!("refs/heads/{}", git_ref)
    };
    let sha = resolve_remote_ref(remote, &full_ref, token)?;
    tracing::info!("{} is at {}", full_ref, sha);
    Ok(TriggerEvent::new(full_ref, sha))
}

/// Run the deploy command.
///
/// Flags win over the CI environment. A `--ref` without `--sha` deploys the ref's
/// current tip. The local `folio.toml`, when present, supplies the primary branch and
/// the default remote; the checked-out source's own config drives everything after
/// checkout.
pub async fn run(
    project: &Project,
    event: EventArgs,
    remote: Option<String>,
    work_dir: Option<PathBuf>,
    token: Option<Token>,
) -> Result<()> {
    let root = project.root();
    let local = project.load_config()?;
    let configured_remote = || remote_url(&root, &local.publish.remote);

    let (trigger, remote) = match (event.git_ref, event.sha) {
        (Some(git_ref), Some(sha)) => (
            TriggerEvent::new(git_ref, sha),
            remote.unwrap_or_else(configured_remote),
        ),
        (Some(git_ref), None) => {
            let remote = remote.unwrap_or_else(configured_remote);
            (event_at_tip(&remote, &git_ref, token.as_ref())?, remote)
        }
        _ => {
            let trigger = TriggerEvent::from_env().map_err(PipelineError::from)?;
            let remote = remote
                .or_else(|| trigger.repository.clone())
                .unwrap_or_else(configured_remote);
            (trigger, remote)
        }
    };
    let trigger = match event.message {
        Some(message) => trigger.with_message(Some(message)),
        None => trigger,
    };

    let report = deploy(&Deployment {
        event: &trigger,
        remote: &remote,
        primary_branch: &local.publish.primary_branch,
        work_dir: work_dir.as_deref(),
        cache_dir: &project.cache_dir,
        generator_version: env!("CARGO_PKG_VERSION"),
        token: token.as_ref(),
    })
    .await?;

    match report.outcome {
        PublishOutcome::Published { commit, .. } => {
            tracing::info!("Deployed {} as {}", report.source_commit, commit);
        }
        PublishOutcome::Unchanged { .. } => {
            tracing::info!("Deployed {}; site unchanged", report.source_commit);
        }
    }

    Ok(())
}
