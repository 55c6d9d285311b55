//! Main installer implementation

use crate::aggregate::aggregate_with;
use crate::handler::VendorFetchHandler;
use crate::pool::FetchPool;
use crate::prune::prune_unused;
use crate::{InstallConfig, InstallOutcome, UpdateReport};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use vendr_errors::{Error, InstallError, UserFacingError};
use vendr_events::{
    AppEvent, EventEmitter, EventSender, FailureContext, FetchEvent, FetchOperation, InstallEvent,
    InstallPhase,
};
use vendr_resolver::ImportResolver;
use vendr_types::{dedupe_dependencies, normalize_name, Dependency, Lockfile, Manifest};
use vendr_vcs::Vcs;

/// Result of an update run: the new lock plus what the pool did
#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub lockfile: Lockfile,
    pub imports: UpdateReport,
    pub dev_imports: UpdateReport,
    /// Vendor directories removed by pruning
    pub pruned: Vec<PathBuf>,
}

/// Drives install, checkout and update for one project
pub struct Installer {
    config: InstallConfig,
    root: PathBuf,
    vendor: PathBuf,
    vcs: Arc<dyn Vcs>,
    cancel: CancellationToken,
    tx: Option<EventSender>,
}

impl EventEmitter for Installer {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl Installer {
    /// Create an installer for the project at `root`, vendoring into
    /// `<root>/vendor`
    pub fn new(config: InstallConfig, root: impl Into<PathBuf>, vcs: Arc<dyn Vcs>) -> Self {
        let root = root.into();
        Self {
            config,
            vendor: root.join("vendor"),
            root,
            vcs,
            cancel: CancellationToken::new(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_vendor_dir(mut self, vendor: impl Into<PathBuf>) -> Self {
        self.vendor = vendor.into();
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn vendor_dir(&self) -> &Path {
        &self.vendor
    }

    /// Token that cancels every pool run and on-demand fetch of this installer
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn pool(&self) -> FetchPool {
        let pool = FetchPool::new(self.config.workers, Arc::clone(&self.vcs))
            .with_cache(self.config.cache.clone())
            .with_timeout(self.config.timeout())
            .with_cancellation(self.cancel.clone());
        match &self.tx {
            Some(tx) => pool.with_event_sender(tx.clone()),
            None => pool,
        }
    }

    /// Bring the vendor tree to the versions recorded in `lock`
    ///
    /// The lock is projected into a manifest named after `manifest`, with
    /// duplicate entries merged. Nothing is fetched when the lock has no
    /// imports.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid. Per-dependency
    /// failures are reported in the outcome, not as errors.
    pub async fn install(&self, lock: &Lockfile, manifest: &Manifest) -> Result<InstallOutcome, Error> {
        self.config.validate()?;

        let mut projected = Manifest::new(manifest.name.clone());
        projected.imports = dedupe_dependencies(
            lock.imports.iter().map(|l| l.to_dependency()).collect(),
        );
        projected.dev_imports = dedupe_dependencies(
            lock.dev_imports.iter().map(|l| l.to_dependency()).collect(),
        );

        if projected.imports.is_empty() {
            self.emit(AppEvent::Install(InstallEvent::NothingToInstall));
            return Ok(InstallOutcome {
                manifest: projected,
                imports: UpdateReport::default(),
                dev_imports: UpdateReport::default(),
            });
        }

        self.emit_operation_started("install");
        self.emit_phase(InstallPhase::Updating);
        let pool = self.pool();
        let imports = pool.run(&projected.imports, &self.vendor).await;
        let dev_imports = pool.run(&projected.dev_imports, &self.vendor).await;
        self.emit_phase(InstallPhase::Done);
        self.emit_operation_completed("install", imports.is_success() && dev_imports.is_success());

        Ok(InstallOutcome {
            manifest: projected,
            imports,
            dev_imports,
        })
    }

    /// Fetch every declared dependency that has no vendor directory yet
    ///
    /// Existing directories are left untouched, whatever they contain, and
    /// dependencies restricted to other platforms are skipped. Returns the
    /// number of repositories fetched.
    ///
    /// # Errors
    ///
    /// Returns an error for a dependency name that is not a valid import
    /// path. Stops at and returns the first fetch failure.
    pub async fn checkout(&self, manifest: &Manifest, include_dev: bool) -> Result<usize, Error> {
        let mut deps: Vec<&Dependency> = manifest.imports.iter().collect();
        if include_dev {
            deps.extend(manifest.dev_imports.iter());
        }

        let mut fetched = 0;
        for dep in deps {
            if !dep.applies_to_current_platform() {
                self.emit(AppEvent::Fetch(FetchEvent::Skipped {
                    package: dep.name.clone(),
                    reason: "not used on this platform".to_string(),
                }));
                continue;
            }

            normalize_name(&dep.name)?;
            let target = self.vendor.join(&dep.name);
            if tokio::fs::metadata(&target).await.is_ok() {
                self.emit(AppEvent::Fetch(FetchEvent::Skipped {
                    package: dep.name.clone(),
                    reason: "already vendored".to_string(),
                }));
                continue;
            }

            if let Err(e) = self.fetch_bounded(dep, &target).await {
                self.emit(AppEvent::Fetch(FetchEvent::Failed {
                    package: dep.name.clone(),
                    operation: FetchOperation::Fetch,
                    failure: FailureContext::from_error(&e),
                }));
                return Err(InstallError::FetchFailed {
                    package: dep.name.clone(),
                    target: target.display().to_string(),
                    message: e.user_message().into_owned(),
                }
                .into());
            }
            fetched += 1;
        }

        Ok(fetched)
    }

    async fn fetch_bounded(&self, dep: &Dependency, target: &Path) -> Result<(), Error> {
        let fetch = self.vcs.fetch(dep, target, &self.config.cache);
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(InstallError::Cancelled.into()),
            result = async {
                match self.config.timeout() {
                    Some(limit) => tokio::time::timeout(limit, fetch).await.unwrap_or_else(|_| {
                        Err(InstallError::OperationTimeout {
                            package: dep.name.clone(),
                            timeout_seconds: limit.as_secs(),
                        }
                        .into())
                    }),
                    None => fetch.await,
                }
            } => result,
        }
    }

    /// Resolve, fetch and update everything `manifest` needs and return the
    /// resulting lock
    ///
    /// # Errors
    ///
    /// See [`Installer::update_with_report`].
    pub async fn update(&self, manifest: &Manifest) -> Result<Lockfile, Error> {
        Ok(self.update_with_report(manifest).await?.lockfile)
    }

    /// [`Installer::update`], also returning the per-dependency reports
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the resolver cannot
    /// be created or fails while walking, or the manifest cannot be hashed.
    /// Failures to update individual repositories are reported, not returned.
    pub async fn update_with_report(&self, manifest: &Manifest) -> Result<UpdateResult, Error> {
        self.config.validate()?;
        self.emit_operation_started("update");

        let declared = dedupe_dependencies(manifest.imports.clone());
        let dev_declared = dedupe_dependencies(manifest.dev_imports.clone());

        self.emit_phase(InstallPhase::Resolving);
        let resolved = self.resolve(&declared).await.inspect_err(|e| {
            self.emit_operation_failed("update", e.to_string());
        })?;

        self.emit_phase(InstallPhase::Aggregating);
        let relative = resolved
            .iter()
            .filter_map(|path| path.strip_prefix(&self.vendor).ok())
            .map(|rel| rel.to_string_lossy().replace('\\', "/"));
        let aggregated = aggregate_with(relative, self.config.dedupe_subpackages, |path, e| {
            self.emit_warning_with_context(format!("skipping import {path}"), e.to_string());
        });
        let deps = merge_declared(aggregated, &declared);

        if !dev_declared.is_empty() {
            self.emit(AppEvent::Install(InstallEvent::DevImportsNotResolved {
                count: dev_declared.len(),
            }));
        }

        self.emit_phase(InstallPhase::Updating);
        let pool = self.pool();
        let imports = pool.run(&deps, &self.vendor).await;
        let dev_imports = pool.run(&dev_declared, &self.vendor).await;

        let pruned = if self.config.delete_unused {
            let mut keep = deps.clone();
            keep.extend(dev_declared.iter().cloned());
            prune_unused(&self.vendor, &keep, self).await?
        } else {
            Vec::new()
        };

        let lockfile = Lockfile::new(&deps, manifest.hash()?).with_dev_imports(&dev_declared);

        self.emit_phase(InstallPhase::Done);
        self.emit_operation_completed("update", imports.is_success() && dev_imports.is_success());

        Ok(UpdateResult {
            lockfile,
            imports,
            dev_imports,
            pruned,
        })
    }

    async fn resolve(&self, declared: &[Dependency]) -> Result<Vec<PathBuf>, Error> {
        tokio::fs::create_dir_all(&self.vendor)
            .await
            .map_err(|e| InstallError::FilesystemError {
                operation: "create_dir_all".to_string(),
                path: self.vendor.display().to_string(),
                message: e.to_string(),
            })?;

        let mut handler = VendorFetchHandler::new(
            self.vendor.clone(),
            Arc::clone(&self.vcs),
            self.config.cache.clone(),
        )
        .with_declared(declared)
        .with_timeout(self.config.timeout())
        .with_cancellation(self.cancel.clone());
        if let Some(tx) = &self.tx {
            handler = handler.with_event_sender(tx.clone());
        }

        let mut resolver = ImportResolver::new(&self.root)?
            .with_vendor_dir(self.vendor.clone())
            .with_source_path(self.config.cache.source_path.clone())
            .with_handler(Arc::new(handler));
        if let Some(tx) = &self.tx {
            resolver = resolver.with_event_sender(tx.clone());
        }

        resolver.resolve_all(declared).await
    }
}

/// Apply declared attributes to aggregated dependencies
///
/// Aggregated order is kept; declared sub-packages missing from the
/// aggregate are appended, and declared dependencies the walk never reached
/// are added at the end.
fn merge_declared(aggregated: Vec<Dependency>, declared: &[Dependency]) -> Vec<Dependency> {
    let mut out: Vec<Dependency> = aggregated
        .into_iter()
        .map(|found| match declared.iter().find(|d| d.name == found.name) {
            Some(decl) => {
                let mut merged = decl.clone();
                merged.subpackages = found.subpackages;
                for sub in &decl.subpackages {
                    if !merged.subpackages.contains(sub) {
                        merged.subpackages.push(sub.clone());
                    }
                }
                merged
            }
            None => found,
        })
        .collect();

    for decl in declared {
        if !out.iter().any(|d| d.name == decl.name) {
            out.push(decl.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use vendr_types::VcsKind;
    use vendr_vcs::CacheOptions;

    /// Fetches that take `delay` and are recorded only once they finish
    struct SlowVcs {
        delay: Duration,
        started: Mutex<Vec<String>>,
        finished: Mutex<Vec<String>>,
    }

    impl SlowVcs {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                started: Mutex::new(Vec::new()),
                finished: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Vcs for SlowVcs {
        async fn fetch(&self, dep: &Dependency, _: &Path, _: &CacheOptions) -> Result<(), Error> {
            self.started.lock().unwrap().push(dep.name.clone());
            tokio::time::sleep(self.delay).await;
            self.finished.lock().unwrap().push(dep.name.clone());
            Ok(())
        }

        async fn update(&self, _: &Dependency, _: &Path, _: &CacheOptions) -> Result<(), Error> {
            Ok(())
        }
    }

    fn manifest(names: &[&str]) -> Manifest {
        let mut manifest = Manifest::new("app");
        manifest.imports = names.iter().map(|n| Dependency::new(*n)).collect();
        manifest
    }

    #[tokio::test(start_paused = true)]
    async fn checkout_fetches_are_bounded_by_the_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(SlowVcs::new(Duration::from_secs(120)));
        let installer = Installer::new(InstallConfig::default().with_timeout(5), dir.path(), vcs.clone());

        let err = installer
            .checkout(&manifest(&["github.com/foo/bar", "github.com/foo/baz"]), false)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Install(InstallError::FetchFailed { ref package, .. }) if package == "github.com/foo/bar"
        ));
        assert!(err.to_string().contains("timed out"));
        assert_eq!(*vcs.started.lock().unwrap(), vec!["github.com/foo/bar".to_string()]);
        assert!(vcs.finished.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn checkout_stops_when_cancelled_mid_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(SlowVcs::new(Duration::from_secs(120)));
        let installer = Installer::new(InstallConfig::default(), dir.path(), vcs.clone());
        let cancel = installer.cancellation_token();

        let m = manifest(&["github.com/foo/bar"]);
        let (result, ()) = tokio::join!(
            installer.checkout(&m, false),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                cancel.cancel();
            }
        );

        assert!(matches!(result, Err(Error::Install(InstallError::FetchFailed { .. }))));
        assert!(vcs.finished.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn checkout_rejects_names_outside_the_vendor_tree() {
        let dir = tempfile::tempdir().unwrap();
        let vcs = Arc::new(SlowVcs::new(Duration::ZERO));
        let installer = Installer::new(InstallConfig::default(), dir.path(), vcs.clone());

        let err = installer
            .checkout(&manifest(&["example.com/.."]), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Name(_)));
        assert!(vcs.started.lock().unwrap().is_empty());
    }

    #[test]
    fn declared_attributes_win_and_order_is_kept() {
        let aggregated = vec![
            Dependency::new("github.com/x/lib").with_subpackages(vec!["a".into()]),
            Dependency::new("github.com/y/app"),
        ];
        let declared = vec![
            Dependency::new("github.com/y/app")
                .with_reference("v1.2.0")
                .with_vcs(VcsKind::Git)
                .with_subpackages(vec!["cmd".into()]),
            Dependency::new("github.com/z/unreached").with_reference("main"),
        ];

        let merged = merge_declared(aggregated, &declared);
        let names: Vec<&str> = merged.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["github.com/x/lib", "github.com/y/app", "github.com/z/unreached"]
        );
        assert_eq!(merged[1].reference, "v1.2.0");
        assert_eq!(merged[1].vcs, VcsKind::Git);
        assert_eq!(merged[1].subpackages, vec!["cmd"]);
        assert!(merged[0].reference.is_empty());
    }
}
