//! The declared dependency manifest (`vendr.yaml`)

use crate::dependency::{dedupe_dependencies, Dependency};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vendr_errors::{Error, ManifestError};
use vendr_hash::Hash;

/// File name of the manifest at a project root
pub const MANIFEST_FILE: &str = "vendr.yaml";

/// Declared dependencies of a project
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(rename = "package", default)]
    pub name: String,
    #[serde(rename = "import", default)]
    pub imports: Vec<Dependency>,
    #[serde(rename = "testImport", default, skip_serializing_if = "Vec::is_empty")]
    pub dev_imports: Vec<Dependency>,
}

impl Manifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a manifest from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid manifest document.
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        serde_yml::from_str(text).map_err(|e| {
            ManifestError::ParseError {
                path: MANIFEST_FILE.to_string(),
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

    /// Load a manifest from disk
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
        serde_yml::from_str(&text).map_err(|e| {
            ManifestError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Write the manifest to disk
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

    /// Fingerprint of the manifest used to detect lock file drift
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized.
    pub fn hash(&self) -> Result<Hash, Error> {
        Ok(Hash::from_data(self.to_yaml()?.as_bytes()))
    }

    /// Collapse duplicate entries in both dependency lists
    pub fn dedupe(&mut self) {
        self.imports = dedupe_dependencies(std::mem::take(&mut self.imports));
        self.dev_imports = dedupe_dependencies(std::mem::take(&mut self.dev_imports));
    }

    /// Look up a declared dependency in either list
    #[must_use]
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.imports
            .iter()
            .chain(self.dev_imports.iter())
            .find(|d| d.name == name)
    }
}
