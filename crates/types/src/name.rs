//! Import path normalization
//!
//! An import path such as `github.com/org/project/sub/pkg` names a package
//! inside a repository. Fetching works per repository, so every path has to be
//! split into the repository root (`github.com/org/project`) and the
//! sub-package suffix (`sub/pkg`). Hosting conventions decide where the root
//! ends; everything here is string manipulation with no I/O.

use vendr_errors::NormalizationError;

/// Segment suffixes that mark the end of a repository root
const VCS_SUFFIXES: [&str; 4] = [".git", ".hg", ".bzr", ".svn"];

/// Split an import path into `(repository root, sub-package suffix)`
///
/// The suffix is empty when the path is itself a repository root.
///
/// # Errors
///
/// Returns a [`NormalizationError`] when the path is empty, has no host-like
/// first segment, or contains empty, `.` or `..` segments.
pub fn normalize_name(path: &str) -> Result<(String, String), NormalizationError> {
    let unified = path.trim().replace('\\', "/");
    let cleaned = unified.trim_start_matches("./").trim_matches('/');
    if cleaned.is_empty() {
        return Err(NormalizationError::Empty);
    }

    let segments: Vec<&str> = cleaned.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(NormalizationError::EmptySegment {
            path: path.to_string(),
        });
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(NormalizationError::DotSegment {
            path: path.to_string(),
        });
    }
    if !segments[0].contains('.') {
        return Err(NormalizationError::NoHost {
            path: path.to_string(),
        });
    }

    let root_len = root_segment_count(&segments).min(segments.len());
    Ok((
        segments[..root_len].join("/"),
        segments[root_len..].join("/"),
    ))
}

/// Whether an import refers to the language's standard library
///
/// Standard packages have no host: their first segment carries no dot.
/// The `C` pseudo-package used by cgo counts as standard.
#[must_use]
pub fn is_standard_library(path: &str) -> bool {
    let first = path.trim_matches('/').split('/').next().unwrap_or_default();
    first.is_empty() || first == "C" || !first.contains('.')
}

fn root_segment_count(segments: &[&str]) -> usize {
    if let Some(pos) = segments
        .iter()
        .skip(1)
        .position(|s| VCS_SUFFIXES.iter().any(|ext| s.ends_with(ext)))
    {
        return pos + 2;
    }

    match segments[0] {
        "github.com" | "bitbucket.org" | "gitlab.com" | "golang.org" | "code.google.com" => 3,
        "hub.jazz.net" => 4,
        "gopkg.in" => segments
            .iter()
            .skip(1)
            .position(|s| is_gopkg_version(s))
            .map_or(2, |pos| pos + 2),
        // launchpad.net, git.apache.org and vanity hosts such as go.uber.org
        _ => 2,
    }
}

fn is_gopkg_version(segment: &str) -> bool {
    segment
        .rsplit_once(".v")
        .is_some_and(|(_, v)| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))
}
