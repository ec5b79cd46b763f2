//! Static site build command.

use std::path::PathBuf;

use anyhow::Result;
use folio_pipeline::{provision_toolchain, PipelineError};
use folio_site::StaticBuilder;

use super::Project;

/// Run the build command.
pub async fn run(project: &Project, output: Option<PathBuf>, minify: Option<bool>) -> Result<()> {
    tracing::info!("Building static site...");

    let root = project.root();
    let file_config = project.load_config()?;
    let toolchain = provision_toolchain(&root, &file_config, &project.provisioner(None))?;

    let mut config = file_config.build_config(&root, toolchain.theme_dir);
    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(minify) = minify {
        config.minify = minify;
    }

    let result = StaticBuilder::new(config)
        .map_err(PipelineError::from)?
        .build()
        .await
        .map_err(PipelineError::from)?;

    tracing::info!(
        "Built {} pages ({} files) in {}ms",
        result.pages,
        result.files,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
