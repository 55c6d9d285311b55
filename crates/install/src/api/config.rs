use std::time::Duration;
use vendr_errors::{Error, InstallError};
use vendr_vcs::CacheOptions;

/// Worker count used when none is configured
pub const DEFAULT_WORKERS: usize = 20;

/// Installer configuration
#[derive(Clone, Debug)]
pub struct InstallConfig {
    /// Concurrent fetch/update workers
    pub workers: usize,
    /// Per-repository operation timeout in seconds, 0 = none
    pub operation_timeout: u64,
    /// Remove vendor directories no dependency refers to after an update
    pub delete_unused: bool,
    /// Drop repeated sub-packages when aggregating resolved imports
    pub dedupe_subpackages: bool,
    /// Mirror cache and source path handling passed to every VCS call
    pub cache: CacheOptions,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            operation_timeout: 0,
            delete_unused: false,
            dedupe_subpackages: false,
            cache: CacheOptions::disabled(),
        }
    }
}

impl InstallConfig {
    /// Set the number of pool workers
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-operation timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.operation_timeout = timeout_seconds;
        self
    }

    #[must_use]
    pub fn with_delete_unused(mut self, delete_unused: bool) -> Self {
        self.delete_unused = delete_unused;
        self
    }

    #[must_use]
    pub fn with_dedupe_subpackages(mut self, dedupe: bool) -> Self {
        self.dedupe_subpackages = dedupe;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheOptions) -> Self {
        self.cache = cache;
        self
    }

    /// Timeout as a duration, `None` when disabled
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.operation_timeout > 0).then(|| Duration::from_secs(self.operation_timeout))
    }

    /// Check the configuration can drive a pool
    ///
    /// # Errors
    ///
    /// Returns `InstallError::InvalidConfig` when `workers` is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(InstallError::InvalidConfig {
                message: "workers must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
