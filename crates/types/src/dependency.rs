//! Dependency records declared in a manifest or discovered by resolution

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Version control system used by an upstream repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VcsKind {
    Git,
    Hg,
    Bzr,
    Svn,
    /// Not declared; detected from the working copy or the remote
    #[default]
    Unknown,
}

impl VcsKind {
    /// All concrete kinds, in detection order
    pub const ALL: [VcsKind; 4] = [Self::Git, Self::Hg, Self::Bzr, Self::Svn];

    /// Name of the command line tool driving this kind
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Bzr => "bzr",
            Self::Svn => "svn",
            Self::Unknown => "",
        }
    }

    /// Metadata directory marking a working copy of this kind
    #[must_use]
    pub fn metadata_dir(self) -> Option<&'static str> {
        match self {
            Self::Git => Some(".git"),
            Self::Hg => Some(".hg"),
            Self::Bzr => Some(".bzr"),
            Self::Svn => Some(".svn"),
            Self::Unknown => None,
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<String> for VcsKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "git" => Self::Git,
            "hg" | "mercurial" => Self::Hg,
            "bzr" | "bazaar" => Self::Bzr,
            "svn" | "subversion" => Self::Svn,
            _ => Self::Unknown,
        }
    }
}

impl From<VcsKind> for String {
    fn from(value: VcsKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One upstream repository and the parts of it a project imports
///
/// `name` is the repository root import path and is the identity of the
/// record: within a dependency list no two entries share a name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "package")]
    pub name: String,
    /// Branch, tag or commit. Empty means unresolved (track the default branch).
    #[serde(rename = "version", default, skip_serializing_if = "String::is_empty")]
    pub reference: String,
    /// Remote location overriding the one derived from `name`
    #[serde(rename = "repo", default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "VcsKind::is_unknown")]
    pub vcs: VcsKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subpackages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arch: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
}

impl Dependency {
    /// Create an unresolved dependency on a repository root
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    #[must_use]
    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    #[must_use]
    pub fn with_vcs(mut self, vcs: VcsKind) -> Self {
        self.vcs = vcs;
        self
    }

    #[must_use]
    pub fn with_subpackages(mut self, subpackages: Vec<String>) -> Self {
        self.subpackages = subpackages;
        self
    }

    /// Whether a reference has been pinned
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !self.reference.is_empty()
    }

    /// Remote URL to fetch from
    #[must_use]
    pub fn remote(&self) -> String {
        match &self.repository {
            Some(repo) if !repo.is_empty() => repo.clone(),
            _ => format!("https://{}", self.name),
        }
    }

    /// Import paths this dependency contributes: the root and every sub-package
    #[must_use]
    pub fn package_paths(&self) -> Vec<String> {
        let mut paths = Vec::with_capacity(self.subpackages.len() + 1);
        paths.push(self.name.clone());
        for sub in &self.subpackages {
            let sub = sub.trim_matches('/');
            if !sub.is_empty() && sub != "." {
                paths.push(format!("{}/{sub}", self.name));
            }
        }
        paths
    }

    /// Whether the dependency applies to the given GOOS/GOARCH style names
    ///
    /// Empty constraint lists match everything.
    #[must_use]
    pub fn applies_to(&self, os: &str, arch: &str) -> bool {
        let os_ok = self.os.is_empty() || self.os.iter().any(|o| o == os);
        let arch_ok = self.arch.is_empty() || self.arch.iter().any(|a| a == arch);
        os_ok && arch_ok
    }

    /// Whether the dependency applies to the platform this binary runs on
    #[must_use]
    pub fn applies_to_current_platform(&self) -> bool {
        self.applies_to(current_os(), current_arch())
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reference.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.reference)
        }
    }
}

/// Current OS in the naming the manifest uses
#[must_use]
pub fn current_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Current architecture in the naming the manifest uses
#[must_use]
pub fn current_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

/// Remove duplicate entries for the same repository root
///
/// The first occurrence keeps its position and attributes; sub-packages of
/// later duplicates are merged into it, skipping ones already listed.
#[must_use]
pub fn dedupe_dependencies(deps: Vec<Dependency>) -> Vec<Dependency> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(deps.len());
    let mut out: Vec<Dependency> = Vec::with_capacity(deps.len());

    for dep in deps {
        if let Some(&pos) = index.get(&dep.name) {
            let existing = &mut out[pos];
            for sub in dep.subpackages {
                if !existing.subpackages.contains(&sub) {
                    existing.subpackages.push(sub);
                }
            }
        } else {
            index.insert(dep.name.clone(), out.len());
            out.push(dep);
        }
    }
    out
}
