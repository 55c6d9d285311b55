//! On-demand fetching for packages the resolver cannot find

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vendr_errors::{Error, InstallError, UserFacingError};
use vendr_events::{AppEvent, EventEmitter, EventSender, ResolverEvent};
use vendr_resolver::MissingPackageHandler;
use vendr_types::{normalize_name, Dependency};
use vendr_vcs::{CacheOptions, Vcs};

/// Fetches the repository of a missing package into the vendor tree
///
/// The repository root is derived from the package path, so a request for
/// `github.com/org/project/sub` clones `github.com/org/project` into
/// `<vendor>/github.com/org/project`. Declared dependencies contribute their
/// reference and remote; anything else is fetched at its default branch.
pub struct VendorFetchHandler {
    vendor: PathBuf,
    vcs: Arc<dyn Vcs>,
    cache: CacheOptions,
    declared: HashMap<String, Dependency>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    tx: Option<EventSender>,
}

impl EventEmitter for VendorFetchHandler {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl VendorFetchHandler {
    pub fn new(vendor: impl Into<PathBuf>, vcs: Arc<dyn Vcs>, cache: CacheOptions) -> Self {
        Self {
            vendor: vendor.into(),
            vcs,
            cache,
            declared: HashMap::new(),
            timeout: None,
            cancel: CancellationToken::new(),
            tx: None,
        }
    }

    /// Dependencies whose attributes are used when their root is fetched
    #[must_use]
    pub fn with_declared(mut self, deps: &[Dependency]) -> Self {
        for dep in deps {
            self.declared
                .entry(dep.name.clone())
                .or_insert_with(|| dep.clone());
        }
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
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

    fn dependency_for(&self, root: &str) -> Dependency {
        self.declared
            .get(root)
            .cloned()
            .unwrap_or_else(|| Dependency::new(root))
    }
}

#[async_trait]
impl MissingPackageHandler for VendorFetchHandler {
    async fn not_found(&self, package: &str) -> Result<bool, Error> {
        if self.cancel.is_cancelled() {
            return Err(InstallError::Cancelled.into());
        }

        let (root, _) = normalize_name(package)?;
        let dep = self.dependency_for(&root);
        let target = self.vendor.join(&root);
        self.emit_debug(format!("fetching {root} for {package}"));

        let fetch = self.vcs.fetch(&dep, &target, &self.cache);
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(InstallError::Cancelled.into()),
            result = async {
                match self.timeout {
                    Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
                        Error::from(InstallError::OperationTimeout {
                            package: root.clone(),
                            timeout_seconds: limit.as_secs(),
                        })
                    })?,
                    None => fetch.await,
                }
            } => result,
        };

        result.map_err(|e| {
            Error::from(InstallError::FetchFailed {
                package: root.clone(),
                target: target.display().to_string(),
                message: e.user_message().into_owned(),
            })
        })?;
        Ok(true)
    }

    async fn on_gopath(&self, package: &str) -> Result<bool, Error> {
        self.emit(AppEvent::Resolver(ResolverEvent::OnSourcePath {
            package: package.to_string(),
        }));
        Ok(false)
    }
}
