//! Removal of vendor directories no dependency refers to

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use vendr_errors::{Error, InstallError};
use vendr_events::{AppEvent, EventEmitter, InstallEvent};
use vendr_types::Dependency;

/// Delete every directory under `vendor` that is neither a dependency root
/// nor an ancestor of one
///
/// Loose files are left alone. Returns the removed directories.
///
/// # Errors
///
/// Returns an error if the vendor tree cannot be read or a directory cannot
/// be removed.
pub async fn prune_unused<E: EventEmitter>(
    vendor: &Path,
    deps: &[Dependency],
    emitter: &E,
) -> Result<Vec<PathBuf>, Error> {
    if fs::metadata(vendor).await.is_err() {
        return Ok(Vec::new());
    }

    let roots: HashSet<&str> = deps.iter().map(|d| d.name.as_str()).collect();
    let mut removed = Vec::new();
    let mut stack = vec![(vendor.to_path_buf(), String::new())];

    while let Some((dir, rel)) = stack.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &dir))?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = if rel.is_empty() {
                name
            } else {
                format!("{rel}/{name}")
            };

            if roots.contains(child.as_str()) {
                continue;
            }
            let prefix = format!("{child}/");
            if roots.iter().any(|root| root.starts_with(&prefix)) {
                stack.push((entry.path(), child));
                continue;
            }

            let path = entry.path();
            fs::remove_dir_all(&path)
                .await
                .map_err(|e| InstallError::FilesystemError {
                    operation: "remove_dir_all".to_string(),
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            emitter.emit(AppEvent::Install(InstallEvent::Pruned {
                path: path.display().to_string(),
            }));
            removed.push(path);
        }
    }

    removed.sort();
    Ok(removed)
}
