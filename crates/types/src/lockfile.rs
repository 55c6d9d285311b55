//! The resolved lock file (`vendr.lock`)

use crate::dependency::{Dependency, VcsKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vendr_errors::{Error, ManifestError};
use vendr_hash::Hash;

/// File name of the lock file at a project root
pub const LOCK_FILE: &str = "vendr.lock";

/// A dependency as recorded in the lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedDependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
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

impl From<&Dependency> for LockedDependency {
    fn from(dep: &Dependency) -> Self {
        Self {
            name: dep.name.clone(),
            version: dep.reference.clone(),
            repository: dep.repository.clone(),
            vcs: dep.vcs,
            subpackages: dep.subpackages.clone(),
            arch: dep.arch.clone(),
            os: dep.os.clone(),
        }
    }
}

impl LockedDependency {
    /// Project back into a dependency record pinned at the locked version
    #[must_use]
    pub fn to_dependency(&self) -> Dependency {
        Dependency {
            name: self.name.clone(),
            reference: self.version.clone(),
            repository: self.repository.clone(),
            vcs: self.vcs,
            subpackages: self.subpackages.clone(),
            arch: self.arch.clone(),
            os: self.os.clone(),
        }
    }
}

/// Snapshot of resolved dependencies plus the fingerprint of the manifest
/// that produced them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    pub hash: Hash,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub imports: Vec<LockedDependency>,
    #[serde(rename = "testImports", default)]
    pub dev_imports: Vec<LockedDependency>,
}

impl Lockfile {
    /// Build a lock record from resolved imports, preserving their order
    #[must_use]
    pub fn new(deps: &[Dependency], hash: Hash) -> Self {
        Self {
            hash,
            updated: Utc::now(),
            imports: deps.iter().map(LockedDependency::from).collect(),
            dev_imports: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_dev_imports(mut self, deps: &[Dependency]) -> Self {
        self.dev_imports = deps.iter().map(LockedDependency::from).collect();
        self
    }

    /// Whether this lock was produced from a manifest with the given hash
    #[must_use]
    pub fn matches(&self, manifest_hash: &Hash) -> bool {
        &self.hash == manifest_hash
    }

    /// Parse a lock file from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid lock document.
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        serde_yml::from_str(text).map_err(|e| {
            ManifestError::ParseError {
                path: LOCK_FILE.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Serialize to YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Load a lock file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound {
                    path: path.display().to_string(),
                }
                .into()
            } else {
                Error::io_with_path(&e, path)
            }
        })?;
        Self::from_yaml(&text)
    }

    /// Write the lock file to disk
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<(), Error> {
        let text = self.to_yaml()?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| Error::io_with_path(&e, path))
    }
}
