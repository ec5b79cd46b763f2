//! Static site builder for folio documentation.
//!
//! Builds a self-contained static site from a tree of markdown pages. The output is
//! rendered into a staging directory and only replaces the previous output once every
//! page, asset, and index has been written.

pub mod assets;
pub mod builder;
pub mod nav;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use nav::NavEntry;
