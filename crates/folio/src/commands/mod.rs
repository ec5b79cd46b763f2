pub mod build;
pub mod deploy;
pub mod init;
pub mod provision;
pub mod publish;
pub mod serve;

use std::path::{Path, PathBuf};

use folio_git::{Git, Token};
use folio_pipeline::{FolioConfig, PipelineError};
use folio_toolchain::Provisioner;

/// Locations shared by every command.
pub struct Project {
    pub config_path: PathBuf,
    pub cache_dir: PathBuf,
}

impl Project {
    /// Directory containing the config file; relative paths resolve against it.
    pub fn root(&self) -> PathBuf {
        match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn load_config(&self) -> Result<FolioConfig, PipelineError> {
        Ok(FolioConfig::load(&self.config_path)?)
    }

    pub fn provisioner(&self, token: Option<Token>) -> Provisioner {
        Provisioner::new(&self.cache_dir, env!("CARGO_PKG_VERSION")).with_token(token)
    }
}

/// Token from the flag or `FOLIO_TOKEN`, falling back to `GITHUB_TOKEN`.
pub fn token(flag: Option<String>) -> Option<Token> {
    flag.or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .filter(|t| !t.is_empty())
        .map(Token::new)
}

/// Turn a configured remote name into its URL; URLs and paths pass through.
pub fn remote_url(root: &Path, remote: &str) -> String {
    match Git::new(root).try_run(&["remote", "get-url", remote]) {
        Ok(Some(url)) if !url.is_empty() => url,
        _ => remote.to_string(),
    }
}
