//! Transitive import walk over the vendor tree

use crate::imports::package_imports;
use crate::MissingPackageHandler;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use vendr_errors::{Error, ResolveError, UserFacingError};
use vendr_events::{AppEvent, EventEmitter, EventSender, FailureContext, ResolverEvent};
use vendr_types::{is_standard_library, normalize_name, Dependency};

/// Walks import declarations starting from a set of dependencies
///
/// Every reachable non-standard import must end up with a directory under
/// the vendor tree. Imports without one are checked against the source path
/// and then handed to the [`MissingPackageHandler`], which is awaited before
/// the walk continues.
#[derive(Clone)]
pub struct ImportResolver {
    base: PathBuf,
    vendor: PathBuf,
    source_path: Option<PathBuf>,
    handler: Option<Arc<dyn MissingPackageHandler>>,
    tx: Option<EventSender>,
}

impl std::fmt::Debug for ImportResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportResolver")
            .field("base", &self.base)
            .field("vendor", &self.vendor)
            .field("source_path", &self.source_path)
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for ImportResolver {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl ImportResolver {
    /// Create a resolver for the project rooted at `base`
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::InvalidBase` if `base` is not a directory.
    pub fn new(base: &Path) -> Result<Self, Error> {
        if !base.is_dir() {
            return Err(ResolveError::InvalidBase {
                path: base.display().to_string(),
                message: "not a directory".to_string(),
            }
            .into());
        }
        Ok(Self {
            base: base.to_path_buf(),
            vendor: base.join("vendor"),
            source_path: None,
            handler: None,
            tx: None,
        })
    }

    /// Use a vendor directory other than `<base>/vendor`
    #[must_use]
    pub fn with_vendor_dir(mut self, vendor: impl Into<PathBuf>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Secondary source tree consulted before the handler's `not_found`
    #[must_use]
    pub fn with_source_path(mut self, source_path: Option<PathBuf>) -> Self {
        self.source_path = source_path;
        self
    }

    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn MissingPackageHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub fn vendor_dir(&self) -> &Path {
        &self.vendor
    }

    /// Walk every import reachable from `deps` and their sub-packages
    ///
    /// Returns the packages found, as paths under the vendor directory, in
    /// discovery order and each once.
    ///
    /// # Errors
    ///
    /// Returns an error if a package directory cannot be read or the
    /// handler fails to fetch a missing package.
    pub async fn resolve_all(&self, deps: &[Dependency]) -> Result<Vec<PathBuf>, Error> {
        let start = Instant::now();
        self.emit(AppEvent::Resolver(ResolverEvent::Started { roots: deps.len() }));

        match self.walk(deps).await {
            Ok(found) => {
                self.emit(AppEvent::Resolver(ResolverEvent::Completed {
                    packages: found.len(),
                    duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                }));
                Ok(found)
            }
            Err(e) => {
                self.emit(AppEvent::Resolver(ResolverEvent::Failed {
                    failure: FailureContext::from_error(&e),
                }));
                Err(e)
            }
        }
    }

    async fn walk(&self, deps: &[Dependency]) -> Result<Vec<PathBuf>, Error> {
        let mut queue: VecDeque<String> = deps.iter().flat_map(Dependency::package_paths).collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut found = Vec::new();

        while let Some(package) = queue.pop_front() {
            if !seen.insert(package.clone()) || is_standard_library(&package) {
                continue;
            }
            if package.starts_with('.') || package.starts_with('/') {
                self.emit(AppEvent::Resolver(ResolverEvent::InvalidImport {
                    package,
                    reason: "relative imports cannot be vendored".to_string(),
                }));
                continue;
            }

            // Validated before the package is joined onto any directory
            let root = match normalize_name(&package) {
                Ok((root, _)) => root,
                Err(e) => {
                    self.emit(AppEvent::Resolver(ResolverEvent::InvalidImport {
                        package,
                        reason: e.to_string(),
                    }));
                    continue;
                }
            };

            let Some(dir) = self.locate(&package, &root).await? else {
                continue;
            };

            for import in package_imports(&package, &dir).await? {
                if !seen.contains(&import) && !is_standard_library(&import) {
                    queue.push_back(import);
                }
            }
            found.push(self.vendor.join(&package));
        }

        Ok(found)
    }

    /// Directory whose sources make up `package`, fetching it when missing
    async fn locate(&self, package: &str, root: &str) -> Result<Option<PathBuf>, Error> {
        let vendored = self.vendor.join(package);
        if vendored.is_dir() {
            return Ok(Some(vendored));
        }

        if let Some(on_path) = self.source_copy(package) {
            self.emit(AppEvent::Resolver(ResolverEvent::OnSourcePath {
                package: package.to_string(),
            }));
            if let Some(handler) = &self.handler {
                handler.on_gopath(package).await?;
            }
            if vendored.is_dir() {
                return Ok(Some(vendored));
            }
            return Ok(Some(on_path));
        }

        if root != package && self.vendor.join(root).is_dir() {
            self.emit(AppEvent::Resolver(ResolverEvent::InvalidImport {
                package: package.to_string(),
                reason: format!("{root} is vendored but has no such package"),
            }));
            return Ok(None);
        }

        let Some(handler) = &self.handler else {
            self.emit_warning(format!("{package} is not vendored and no fetcher is set"));
            return Ok(None);
        };

        self.emit(AppEvent::Resolver(ResolverEvent::PackageMissing {
            package: package.to_string(),
            destination: vendored.display().to_string(),
        }));
        let fetched = handler.not_found(package).await.map_err(|e| {
            Error::from(ResolveError::Unresolvable {
                package: package.to_string(),
                message: e.user_message().into_owned(),
            })
        })?;

        if fetched && vendored.is_dir() {
            Ok(Some(vendored))
        } else {
            self.emit(AppEvent::Resolver(ResolverEvent::InvalidImport {
                package: package.to_string(),
                reason: "no such package in the fetched repository".to_string(),
            }));
            Ok(None)
        }
    }

    fn source_copy(&self, package: &str) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .map(|root| root.join("src").join(package))
            .filter(|dir| dir.is_dir())
    }
}
