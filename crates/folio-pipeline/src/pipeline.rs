//! Staged, fail-fast deployment.

use std::fmt;
use std::path::{Path, PathBuf};

use folio_git::{
    checkout, commit_message, CheckoutError, CheckoutRequest, PublishError, PublishOutcome,
    PublishRequest, Token,
};
use folio_site::{BuildError, BuildResult, StaticBuilder};
use folio_toolchain::{Environment, Manifest, ManifestError, ProvisionError, Provisioner};

use crate::config::{ConfigError, FolioConfig, CONFIG_FILE};
use crate::trigger::{TriggerError, TriggerEvent};

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checkout,
    Provision,
    Build,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Checkout => "checkout",
            Stage::Provision => "provision",
            Stage::Build => "build",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// The first error of a run, tagged with the stage that produced it.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),

    #[error("theme '{0}' is not a dependency in the toolchain manifest")]
    UnknownTheme(String),

    #[error("checkout failed: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("toolchain manifest: {0}")]
    Manifest(#[from] ManifestError),

    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl PipelineError {
    /// Stage that failed; `None` for usage and configuration errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Config(_) | Self::Trigger(_) | Self::UnknownTheme(_) => None,
            Self::Checkout(_) => Some(Stage::Checkout),
            Self::Manifest(_) | Self::Provision(_) => Some(Stage::Provision),
            Self::Build(_) => Some(Stage::Build),
            Self::Publish(_) => Some(Stage::Publish),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self.stage() {
            None => 2,
            Some(Stage::Checkout) => 10,
            Some(Stage::Provision) => 11,
            Some(Stage::Build) => 12,
            Some(Stage::Publish) => 13,
        }
    }
}

/// Result of the provisioning stage.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
    /// Provisioned environment, when the source declares a manifest
    pub environment: Option<Environment>,
    /// Theme directory inside the environment
    pub theme_dir: Option<PathBuf>,
}

/// Provision the toolchain declared under `root` and resolve the configured theme.
///
/// Without a manifest there is nothing to install and the built-in theme is used; a
/// configured theme then has nothing to resolve against.
pub fn provision_toolchain(
    root: &Path,
    config: &FolioConfig,
    provisioner: &Provisioner,
) -> Result<Toolchain, PipelineError> {
    let manifest_path = root.join(folio_toolchain::manifest::MANIFEST_FILE);
    if !manifest_path.exists() {
        if let Some(theme) = &config.site.theme {
            return Err(PipelineError::UnknownTheme(theme.clone()));
        }
        tracing::info!(
            "No {} found; building with the built-in theme",
            folio_toolchain::manifest::MANIFEST_FILE
        );
        return Ok(Toolchain::default());
    }

    let manifest = Manifest::load(&manifest_path)?;
    if let Some(theme) = &config.site.theme {
        if manifest.dependency(theme).is_none() {
            return Err(PipelineError::UnknownTheme(theme.clone()));
        }
    }

    let environment = provisioner.provision(&manifest)?;
    let theme_dir = config
        .site
        .theme
        .as_deref()
        .map(|theme| environment.dependency_dir(theme));

    Ok(Toolchain {
        environment: Some(environment),
        theme_dir,
    })
}

/// Inputs for a full deployment.
#[derive(Debug, Clone)]
pub struct Deployment<'a> {
    pub event: &'a TriggerEvent,
    /// Source repository; the site is also published to it
    pub remote: &'a str,
    /// Branch whose pushes are published
    pub primary_branch: &'a str,
    /// Where to check out the source; a temporary directory when `None`
    pub work_dir: Option<&'a Path>,
    /// Root of the provisioned environment cache
    pub cache_dir: &'a Path,
    /// Version of the running generator
    pub generator_version: &'a str,
    pub token: Option<&'a Token>,
}

/// What a successful deployment did.
#[derive(Debug)]
pub struct DeployReport {
    pub source_commit: String,
    pub environment: Option<Environment>,
    pub build: BuildResult,
    pub outcome: PublishOutcome,
}

/// Run checkout, provisioning, build, and publication in order.
///
/// Each stage only starts if the previous one succeeded. The remote publishing branch
/// is touched only by the final push.
pub async fn deploy(deployment: &Deployment<'_>) -> Result<DeployReport, PipelineError> {
    let event = deployment.event;
    event.accept(deployment.primary_branch)?;

    let scratch;
    let work_dir = match deployment.work_dir {
        Some(dir) => dir.to_path_buf(),
        None => {
            scratch = tempfile::Builder::new()
                .prefix("folio-deploy-")
                .tempdir()
                .map_err(|source| CheckoutError::Io {
                    context: "creating checkout directory".to_string(),
                    source,
                })?;
            scratch.path().join("source")
        }
    };

    tracing::info!("[{}] {} at {}", Stage::Checkout, event.git_ref, event.sha);
    let source = checkout(&CheckoutRequest {
        remote: deployment.remote,
        commit: &event.sha,
        dest: &work_dir,
        token: deployment.token,
    })?;

    let config = FolioConfig::load(&source.dir.join(CONFIG_FILE))?;

    tracing::info!("[{}] resolving toolchain", Stage::Provision);
    let provisioner = Provisioner::new(deployment.cache_dir, deployment.generator_version)
        .with_token(deployment.token.cloned());
    let toolchain = provision_toolchain(&source.dir, &config, &provisioner)?;

    tracing::info!("[{}] rendering site", Stage::Build);
    let build_config = config.build_config(&source.dir, toolchain.theme_dir.clone());
    let build = StaticBuilder::new(build_config)?.build().await?;
    tracing::info!(
        "Built {} pages ({} files) in {}ms",
        build.pages,
        build.files,
        build.duration_ms
    );

    tracing::info!("[{}] updating {}", Stage::Publish, config.publish.branch);
    let identity = config.identity();
    let message = commit_message(&source.commit, event.message.as_deref());
    let options = config.publish_options();
    let outcome = folio_git::publish(&PublishRequest {
        repo_dir: &source.dir,
        remote: deployment.remote,
        site_dir: &build.output_dir,
        identity: &identity,
        message: &message,
        token: deployment.token,
        options: &options,
    })?;

    Ok(DeployReport {
        source_commit: source.commit,
        environment: toolchain.environment,
        build,
        outcome,
    })
}
