//! Project root and vendor directory discovery

use crate::constants::VENDOR_DIR;
use std::path::{Path, PathBuf};
use vendr_errors::{Error, InstallError, ManifestError};
use vendr_types::MANIFEST_FILE;

/// Walk up from `start` to the first directory containing a manifest
///
/// # Errors
///
/// Returns an error if no ancestor of `start` contains `vendr.yaml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Error> {
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            ManifestError::ProjectRootNotFound {
                start: start.display().to_string(),
            }
            .into()
        })
}

/// The vendor directory of the project enclosing `start`
///
/// The directory itself does not need to exist yet.
///
/// # Errors
///
/// Returns `InstallError::VendorNotFound` if `start` is not inside a project.
pub fn vendor_dir(start: &Path) -> Result<PathBuf, Error> {
    let root = find_project_root(start).map_err(|e| InstallError::VendorNotFound {
        message: e.to_string(),
    })?;
    Ok(root.join(VENDOR_DIR))
}
