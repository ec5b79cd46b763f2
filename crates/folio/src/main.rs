//! folio CLI - build markdown documentation and publish it to a branch.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use folio_pipeline::PipelineError;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Build markdown documentation into a static site and publish it to a branch")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to folio.toml config file
    #[arg(short, long, global = true, default_value = "folio.toml")]
    config: PathBuf,

    /// Directory holding provisioned toolchain environments
    #[arg(long, global = true, env = "FOLIO_CACHE_DIR", default_value = ".folio/cache")]
    cache_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold a documentation project in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Build the static site
    Build {
        /// Output directory (defaults to config or "site")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Install the pinned toolchain and print its environment directory
    Provision {
        /// Access token for private dependencies
        #[arg(long, env = "FOLIO_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Publish an already built site to the publishing branch
    Publish {
        /// Directory to publish (defaults to the configured output)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Remote name or URL (defaults to the configured remote)
        #[arg(long)]
        remote: Option<String>,

        /// Change description for the commit message body
        #[arg(short, long)]
        message: Option<String>,

        /// Access token for https remotes
        #[arg(long, env = "FOLIO_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Run checkout, provisioning, build, and publish for a push event
    Deploy {
        /// Pushed ref; read from GITHUB_REF when omitted. Without --sha, its
        /// current tip on the remote is deployed
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Pushed commit; read from GITHUB_SHA when omitted
        #[arg(long, requires = "git_ref")]
        sha: Option<String>,

        /// Change description for the commit message body
        #[arg(short, long)]
        message: Option<String>,

        /// Repository URL to check out and publish to
        #[arg(long)]
        remote: Option<String>,

        /// Checkout directory (a temporary directory by default)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Access token for https remotes
        #[arg(long, env = "FOLIO_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Preview a built site
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve (defaults to the configured output)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt().with_env_filter(filter).with_target(false).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let project = commands::Project {
        config_path: cli.config,
        cache_dir: cli.cache_dir,
    };

    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&project.root(), yes)?;
        }
        Commands::Build { output, no_minify } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&project, output, minify).await?;
        }
        Commands::Provision { token } => {
            commands::provision::run(&project, commands::token(token))?;
        }
        Commands::Publish {
            dir,
            remote,
            message,
            token,
        } => {
            commands::publish::run(&project, dir, remote, message, commands::token(token))?;
        }
        Commands::Deploy {
            git_ref,
            sha,
            message,
            remote,
            work_dir,
            token,
        } => {
            let event = commands::deploy::EventArgs {
                git_ref,
                sha,
                message,
            };
            commands::deploy::run(&project, event, remote, work_dir, commands::token(token))
                .await?;
        }
        Commands::Serve { port, dir, no_open } => {
            commands::serve::run(&project, port, dir, !no_open).await?;
        }
    }

    Ok(())
}

/// Stage errors carry their own code; anything else is a usage error.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PipelineError>()
        .map(|e| e.exit_code())
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_pipeline::TriggerError;

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "folio",
            "build",
            "--config",
            "site/folio.toml",
            "--verbose",
            "--no-minify",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("site/folio.toml"));
        assert!(matches!(
            cli.command,
            Commands::Build {
                no_minify: true,
                ..
            }
        ));
    }

    #[test]
    fn deploy_sha_requires_ref() {
        assert!(Cli::try_parse_from([
            "folio",
            "deploy",
            "--sha",
            "0123456789abcdef0123456789abcdef01234567",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["folio", "deploy", "--ref", "main"]).is_ok());
        assert!(Cli::try_parse_from([
            "folio",
            "deploy",
            "--ref",
            "refs/heads/main",
            "--sha",
            "0123456789abcdef0123456789abcdef01234567",
        ])
        .is_ok());
    }

    #[test]
    fn exit_codes_come_from_pipeline_errors() {
        let wrong_branch = anyhow::Error::new(PipelineError::from(TriggerError::WrongBranch {
            branch: "dev".to_string(),
            primary: "main".to_string(),
        }));
        let other = anyhow::anyhow!("Directory not found");

        assert_eq!(exit_code(&wrong_branch), 2);
        assert_eq!(exit_code(&other), 2);
    }
}
