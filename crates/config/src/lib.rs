#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for vendr
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/vendr/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod project;

pub use project::{find_project_root, vendor_dir};

use constants::{CACHE_SRC_DIR, CONFIG_DIR_NAME, CONFIG_FILE, DEFAULT_WORKERS, HOME_DIR_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use vendr_errors::{ConfigError, Error};
use vendr_types::{ColorChoice, OutputFormat};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub install: InstallSettings,

    #[serde(default)]
    pub cache: CacheConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Install/update behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallSettings {
    /// Concurrent fetch/update workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Per-repository operation timeout in seconds, 0 = none
    #[serde(default)]
    pub operation_timeout: u64,
    /// Replace vendored copies that are not VCS working copies
    #[serde(default)]
    pub force: bool,
    /// Remove vendor directories no dependency refers to after an update
    #[serde(default)]
    pub delete_unused: bool,
    /// Drop repeated sub-package entries when aggregating resolved imports
    #[serde(default)]
    pub dedupe_subpackages: bool,
}

/// Repository cache and secondary source location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Home directory for caches (default ~/.vendr)
    pub home: Option<PathBuf>,
    /// Mirror repositories under the home and clone from the mirror
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    /// Also copy freshly fetched repositories into the source path
    #[serde(default)]
    pub use_cache_source_path: bool,
    /// Copy repositories already present in the source path instead of fetching
    #[serde(default)]
    pub use_source_path: bool,
    /// Secondary source tree laid out as `<source_path>/src/<import path>`
    pub source_path: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            operation_timeout: 0,
            force: false,
            delete_unused: false,
            dedupe_subpackages: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            home: None,
            use_cache: true,
            use_cache_source_path: false,
            use_source_path: false,
            source_path: None,
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_use_cache() -> bool {
    true
}

fn parse_bool(field: &str, value: String) -> Result<bool, Error> {
    match value.as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        }
        .into()),
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!("no config at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Write configuration to a file, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn save_to_file(&self, path: &Path) -> Result<(), Error> {
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            error: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfigError::WriteError {
                    path: parent.display().to_string(),
                    error: e.to_string(),
                })?;
        }
        fs::write(path, contents)
            .await
            .map_err(|e| ConfigError::WriteError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
        Ok(())
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // VENDR_OUTPUT
        if let Ok(output) = std::env::var("VENDR_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "VENDR_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // VENDR_COLOR
        if let Ok(color) = std::env::var("VENDR_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "VENDR_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        // VENDR_HOME
        if let Ok(home) = std::env::var("VENDR_HOME") {
            self.cache.home = Some(PathBuf::from(home));
        }

        // VENDR_WORKERS
        if let Ok(workers) = std::env::var("VENDR_WORKERS") {
            let parsed: usize = workers.parse().map_err(|_| ConfigError::InvalidValue {
                field: "VENDR_WORKERS".to_string(),
                value: workers.clone(),
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "VENDR_WORKERS".to_string(),
                    value: workers,
                }
                .into());
            }
            self.install.workers = parsed;
        }

        // VENDR_USE_CACHE
        if let Ok(use_cache) = std::env::var("VENDR_USE_CACHE") {
            self.cache.use_cache = parse_bool("VENDR_USE_CACHE", use_cache)?;
        }

        // VENDR_SOURCE_PATH
        if let Ok(source) = std::env::var("VENDR_SOURCE_PATH") {
            self.cache.source_path = Some(PathBuf::from(source));
        }

        Ok(())
    }

    /// Reject values the installer cannot work with
    ///
    /// # Errors
    ///
    /// Returns an error if `install.workers` is zero.
    pub fn validate(&self) -> Result<(), Error> {
        if self.install.workers == 0 {
            return Err(ConfigError::InvalidValue {
                field: "install.workers".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Home directory for caches
    #[must_use]
    pub fn home(&self) -> PathBuf {
        self.cache.home.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(HOME_DIR_NAME)
        })
    }

    /// Directory holding repository mirrors
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.home().join(CACHE_SRC_DIR)
    }

    /// Secondary source tree, falling back to the first `GOPATH` entry
    #[must_use]
    pub fn source_path(&self) -> Option<PathBuf> {
        self.cache.source_path.clone().or_else(|| {
            std::env::var_os("GOPATH")
                .and_then(|paths| std::env::split_paths(&paths).next())
                .filter(|p| !p.as_os_str().is_empty())
        })
    }
}
