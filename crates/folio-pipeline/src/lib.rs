//! The folio deployment pipeline.
//!
//! Checkout, provisioning, build, and publication run strictly in order. The first
//! failing stage ends the run, and its error names the stage so the binary can map it
//! to an exit code. Nothing reaches the publishing branch unless every earlier stage
//! succeeded.

pub mod config;
pub mod pipeline;
pub mod trigger;

pub use config::{ConfigError, FolioConfig, CONFIG_FILE};
pub use pipeline::{
    deploy, provision_toolchain, DeployReport, Deployment, PipelineError, Stage, Toolchain,
};
pub use trigger::{TriggerError, TriggerEvent};
