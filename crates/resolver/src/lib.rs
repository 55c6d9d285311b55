#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Import graph resolution for vendr
//!
//! The resolver reads `import` declarations from Go sources, starting at the
//! declared dependencies, and follows them through the vendor tree. It never
//! fetches anything itself: packages with no working copy are reported to a
//! [`MissingPackageHandler`], and the walk resumes once the handler returns.

mod imports;
mod resolver;

pub use imports::{is_build_file, package_imports, parse_imports};
pub use resolver::ImportResolver;

use async_trait::async_trait;
use vendr_errors::Error;

/// Callbacks invoked by [`ImportResolver`] for imports it cannot find
#[async_trait]
pub trait MissingPackageHandler: Send + Sync {
    /// `package` has no directory in the vendor tree
    ///
    /// Returns `Ok(true)` once the package's repository has been placed in
    /// the vendor tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository could not be fetched.
    async fn not_found(&self, package: &str) -> Result<bool, Error>;

    /// `package` is not vendored but exists in the secondary source tree
    ///
    /// Returns `Ok(true)` if the handler moved it into the vendor tree.
    ///
    /// # Errors
    ///
    /// Implementations may fail if they attempt a copy.
    async fn on_gopath(&self, package: &str) -> Result<bool, Error>;
}
