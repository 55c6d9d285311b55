//! Local repository mirrors and the secondary source tree

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use vendr_errors::{Error, InstallError};
use vendr_hash::Hash;

/// Where repositories may be mirrored or copied from
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    /// Home directory; mirrors live under `<home>/cache/src`
    pub home: PathBuf,
    /// Fetch through a mirror under `home`
    pub use_cache: bool,
    /// Copy fresh fetches into the source path as well
    pub use_cache_source_path: bool,
    /// Copy existing repositories out of the source path
    pub use_source_path: bool,
    /// Secondary source tree, laid out as `<source_path>/src/<root>`
    pub source_path: Option<PathBuf>,
}

impl CacheOptions {
    /// Options that never touch a cache or source path
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Directory mirroring `remote`
    #[must_use]
    pub fn mirror_dir(&self, remote: &str) -> PathBuf {
        self.home.join("cache").join("src").join(cache_key(remote))
    }

    /// Copy of `name` inside the source path, if one is configured
    #[must_use]
    pub fn source_copy(&self, name: &str) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .map(|root| root.join("src").join(name))
    }
}

/// Stable directory name for a remote location
#[must_use]
pub fn cache_key(remote: &str) -> String {
    let normalized = remote.trim().trim_end_matches('/').to_ascii_lowercase();
    Hash::from_data(normalized.as_bytes()).short()
}

/// Recursively copy directory contents, VCS metadata included
pub fn copy_directory<'a>(
    src: &'a Path,
    dst: &'a Path,
) -> Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>> {
    Box::pin(async move {
        fs::create_dir_all(dst)
            .await
            .map_err(|e| InstallError::FilesystemError {
                operation: "create_dir".to_string(),
                path: dst.display().to_string(),
                message: e.to_string(),
            })?;

        let mut entries = fs::read_dir(src).await?;
        while let Some(entry) = entries.next_entry().await? {
            let entry_path = entry.path();
            let dst_path = dst.join(entry.file_name());

            if entry.file_type().await?.is_dir() {
                copy_directory(&entry_path, &dst_path).await?;
            } else {
                fs::copy(&entry_path, &dst_path)
                    .await
                    .map_err(|e| Error::io_with_path(&e, &entry_path))?;
            }
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_ignores_case_and_trailing_slash() {
        assert_eq!(
            cache_key("https://github.com/Foo/Bar/"),
            cache_key("https://github.com/foo/bar")
        );
        assert_ne!(
            cache_key("https://github.com/foo/bar"),
            cache_key("https://github.com/foo/baz")
        );
        assert_eq!(cache_key("https://example.com/a").len(), 16);
    }

    #[test]
    fn layout() {
        let options = CacheOptions {
            home: PathBuf::from("/home/u/.vendr"),
            source_path: Some(PathBuf::from("/go")),
            ..CacheOptions::default()
        };
        let mirror = options.mirror_dir("https://github.com/foo/bar");
        assert!(mirror.starts_with("/home/u/.vendr/cache/src"));
        assert_eq!(
            options.source_copy("github.com/foo/bar"),
            Some(PathBuf::from("/go/src/github.com/foo/bar"))
        );
        assert_eq!(CacheOptions::disabled().source_copy("x.org/a"), None);
    }

    #[tokio::test]
    async fn copies_nested_trees() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join(".git/refs")).unwrap();
        std::fs::write(src.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        std::fs::write(src.path().join("lib.go"), "package lib\n").unwrap();

        let target = dst.path().join("copy");
        copy_directory(src.path(), &target).await.unwrap();

        assert!(target.join(".git/refs").is_dir());
        assert_eq!(
            std::fs::read_to_string(target.join("lib.go")).unwrap(),
            "package lib\n"
        );
    }
}
