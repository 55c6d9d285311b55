//! Working copy detection and per-tool command recipes

use crate::command::VcsCommand;
use std::path::Path;
use vendr_errors::{Error, VcsError};
use vendr_types::{Dependency, VcsKind};

/// Kind of the working copy at `path`, if it is one
pub async fn detect_kind(path: &Path) -> Option<VcsKind> {
    for kind in VcsKind::ALL {
        let Some(dir) = kind.metadata_dir() else {
            continue;
        };
        if tokio::fs::metadata(path.join(dir)).await.is_ok() {
            return Some(kind);
        }
    }
    None
}

/// Kind to use for a dependency that has no working copy yet
///
/// A declared kind wins. Otherwise the remote's scheme, suffix and host are
/// consulted, and git is assumed when nothing else matches.
#[must_use]
pub fn guess_kind(dep: &Dependency) -> VcsKind {
    if !dep.vcs.is_unknown() {
        return dep.vcs;
    }

    let remote = dep.remote();
    let lower = remote.to_ascii_lowercase();

    if lower.starts_with("svn://") || lower.starts_with("svn+ssh://") {
        return VcsKind::Svn;
    }
    if lower.starts_with("bzr://") || lower.starts_with("bzr+ssh://") || lower.starts_with("lp:") {
        return VcsKind::Bzr;
    }
    if lower.starts_with("git://") || lower.starts_with("git@") {
        return VcsKind::Git;
    }

    let trimmed = lower.trim_end_matches('/');
    for kind in VcsKind::ALL {
        if let Some(dir) = kind.metadata_dir() {
            if trimmed.ends_with(dir) {
                return kind;
            }
        }
    }

    let host = dep.name.split('/').next().unwrap_or_default();
    match host {
        "launchpad.net" => VcsKind::Bzr,
        _ => VcsKind::Git,
    }
}

fn tool(kind: VcsKind, package: &str) -> Result<VcsCommand, Error> {
    if kind.is_unknown() {
        return Err(VcsError::Unsupported {
            package: package.to_string(),
            kind: kind.to_string(),
        }
        .into());
    }
    Ok(VcsCommand::new(kind.as_str()))
}

/// Manifest values are passed positionally and must not parse as options
fn positional<'a>(package: &str, field: &str, value: &'a str) -> Result<&'a str, Error> {
    if value.starts_with('-') {
        return Err(VcsError::OptionLikeArgument {
            package: package.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
        .into());
    }
    Ok(value)
}

/// Command creating a working copy of `remote` at `target`
///
/// # Errors
///
/// Returns `VcsError::Unsupported` for an unknown kind.
pub fn clone_command(
    kind: VcsKind,
    package: &str,
    remote: &str,
    target: &Path,
) -> Result<VcsCommand, Error> {
    let cmd = tool(kind, package)?;
    let remote = positional(package, "remote", remote)?;
    let cmd = match kind {
        VcsKind::Git | VcsKind::Hg => cmd.args(["clone", "--quiet", remote]),
        VcsKind::Bzr => cmd.args(["branch", "--quiet", remote]),
        VcsKind::Svn | VcsKind::Unknown => cmd.args(["checkout", "--quiet", remote]),
    };
    Ok(cmd.path_arg(target))
}

/// Commands bringing the working copy at `dir` up to date with its remote
///
/// # Errors
///
/// Returns `VcsError::Unsupported` for an unknown kind.
pub fn update_commands(
    kind: VcsKind,
    package: &str,
    dir: &Path,
    track_default_branch: bool,
) -> Result<Vec<VcsCommand>, Error> {
    let cmd = tool(kind, package)?.current_dir(dir);
    let commands = match kind {
        VcsKind::Git => {
            let mut steps = vec![cmd.clone().args(["fetch", "--quiet", "--tags", "origin"])];
            if track_default_branch {
                steps.push(cmd.args(["pull", "--quiet", "--ff-only"]));
            }
            steps
        }
        VcsKind::Hg if track_default_branch => vec![cmd.args(["pull", "--quiet", "--update"])],
        VcsKind::Hg | VcsKind::Bzr => vec![cmd.args(["pull", "--quiet"])],
        VcsKind::Svn | VcsKind::Unknown => vec![cmd.args(["update", "--quiet"])],
    };
    Ok(commands)
}

/// Command moving the working copy at `dir` to `reference`
///
/// # Errors
///
/// Returns `VcsError::Unsupported` for an unknown kind.
pub fn checkout_command(
    kind: VcsKind,
    package: &str,
    dir: &Path,
    reference: &str,
) -> Result<VcsCommand, Error> {
    let cmd = tool(kind, package)?.current_dir(dir);
    let reference = positional(package, "reference", reference)?;
    let cmd = match kind {
        VcsKind::Git => cmd.args(["checkout", "--quiet", reference]),
        VcsKind::Hg | VcsKind::Bzr | VcsKind::Svn | VcsKind::Unknown => {
            cmd.args(["update", "--quiet", "-r", reference])
        }
    };
    Ok(cmd)
}
