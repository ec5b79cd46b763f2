//! Pinned dependency manifest and content-addressed provisioning.
//!
//! A manifest pins the generator version and every theme dependency to an exact
//! commit or content digest. Provisioning materializes those dependencies into a
//! directory named after the manifest's checksum, so an unchanged manifest reuses
//! the same environment and a changed one never sees a stale one.

pub mod digest;
pub mod manifest;
pub mod provision;

pub use digest::{content_hash, tree_digest};
pub use manifest::{Dependency, DependencySource, Manifest, ManifestError};
pub use provision::{Environment, ProvisionError, Provisioner};
