#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Version control primitives for vendr
//!
//! The installer only needs two operations: create a working copy of a
//! dependency at a path, and bring an existing working copy in a base
//! directory to the dependency's reference. [`Vcs`] names that seam so tests
//! can substitute an in-memory implementation; [`CommandVcs`] is the real one.

pub mod cache;
pub mod command;
pub mod driver;
pub mod kind;

pub use cache::{cache_key, copy_directory, CacheOptions};
pub use command::VcsCommand;
pub use driver::CommandVcs;
pub use kind::{detect_kind, guess_kind};

use async_trait::async_trait;
use std::path::Path;
use vendr_errors::Error;
use vendr_types::Dependency;

/// Fetch and update operations on dependency working copies
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Create a working copy of `dep` at `target`, pinned to its reference
    /// when one is set
    ///
    /// # Errors
    ///
    /// Returns an error if the clone or checkout fails.
    async fn fetch(&self, dep: &Dependency, target: &Path, cache: &CacheOptions)
        -> Result<(), Error>;

    /// Bring `<base_dir>/<dep.name>` to `dep`'s reference, fetching it when
    /// absent
    ///
    /// # Errors
    ///
    /// Returns an error if the target exists but is not a working copy, or
    /// if any VCS command fails.
    async fn update(
        &self,
        dep: &Dependency,
        base_dir: &Path,
        cache: &CacheOptions,
    ) -> Result<(), Error>;
}
