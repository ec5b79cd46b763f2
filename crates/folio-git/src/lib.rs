//! Git plumbing for folio.
//!
//! Everything here shells out to the `git` binary. The source repository's work tree
//! and index are never touched: checkouts go into fresh directories and publication
//! builds its tree through a private index file.

pub mod checkout;
pub mod identity;
pub mod publish;
pub mod runner;

pub use checkout::{checkout, resolve_remote_ref, Checkout, CheckoutError, CheckoutRequest};
pub use identity::{commit_message, Identity};
pub use publish::{publish, PublishError, PublishOptions, PublishOutcome, PublishRequest};
pub use runner::{authenticated_url, is_commit_id, Git, GitError, Token};

#[cfg(test)]
pub(crate) mod testutil;
