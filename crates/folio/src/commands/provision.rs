//! Toolchain provisioning command.

use anyhow::Result;
use folio_git::Token;
use folio_pipeline::provision_toolchain;

use super::Project;

/// Run the provision command, printing the environment directory.
pub fn run(project: &Project, token: Option<Token>) -> Result<()> {
    let root = project.root();
    let config = project.load_config()?;
    let toolchain = provision_toolchain(&root, &config, &project.provisioner(token))?;

    match toolchain.environment {
        Some(env) => {
            if env.reused {
                tracing::info!("Environment {} already provisioned", env.checksum);
            }
            println!("{}", env.root.display());
        }
        None => tracing::info!("Nothing to provision"),
    }

    Ok(())
}
