//! Fixed names used for project layout and configuration discovery

/// Directory beneath the project root that holds fetched working copies
pub const VENDOR_DIR: &str = "vendor";

/// Directory under the user config dir holding `config.toml`
pub const CONFIG_DIR_NAME: &str = "vendr";

pub const CONFIG_FILE: &str = "config.toml";

/// Default home directory name (beneath the user's home) for caches
pub const HOME_DIR_NAME: &str = ".vendr";

/// Sub-directory of the home holding repository mirrors
pub const CACHE_SRC_DIR: &str = "cache/src";

/// Default number of concurrent fetch/update workers
pub const DEFAULT_WORKERS: usize = 20;
