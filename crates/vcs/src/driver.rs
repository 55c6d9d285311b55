//! [`Vcs`] implementation driving the VCS command line tools

use crate::cache::{copy_directory, CacheOptions};
use crate::kind::{checkout_command, clone_command, detect_kind, guess_kind, update_commands};
use crate::Vcs;
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tokio::fs;
use vendr_errors::{Error, InstallError, VcsError};
use vendr_events::{AppEvent, EventEmitter, EventSender, FetchEvent, FetchOperation};
use vendr_types::{Dependency, VcsKind};

/// Runs `git`, `hg`, `bzr` and `svn` as subprocesses
#[derive(Debug, Clone, Default)]
pub struct CommandVcs {
    force: bool,
    tx: Option<EventSender>,
}

impl EventEmitter for CommandVcs {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl CommandVcs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace directories that are not working copies instead of failing
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    async fn clone_into(
        &self,
        dep: &Dependency,
        kind: VcsKind,
        target: &Path,
        cache: &CacheOptions,
    ) -> Result<(), Error> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| InstallError::FilesystemError {
                    operation: "create_dir".to_string(),
                    path: parent.display().to_string(),
                    message: e.to_string(),
                })?;
        }

        if cache.use_source_path {
            if let Some(source) = cache.source_copy(&dep.name) {
                if detect_kind(&source).await.is_some() {
                    copy_directory(&source, target).await?;
                    self.emit(AppEvent::Fetch(FetchEvent::CopiedFromSourcePath {
                        package: dep.name.clone(),
                        source: source.display().to_string(),
                    }));
                    return Ok(());
                }
            }
        }

        let remote = dep.remote();
        if cache.use_cache {
            let mirror = cache.mirror_dir(&remote);
            if detect_kind(&mirror).await.is_some() {
                for step in update_commands(kind, &dep.name, &mirror, true)? {
                    step.run().await?;
                }
            } else {
                if let Some(parent) = mirror.parent() {
                    fs::create_dir_all(parent).await?;
                }
                clone_command(kind, &dep.name, &remote, &mirror)?.run().await?;
            }
            copy_directory(&mirror, target).await?;
        } else {
            clone_command(kind, &dep.name, &remote, target)?.run().await?;
        }

        if cache.use_cache_source_path {
            if let Some(dest) = cache.source_copy(&dep.name) {
                if !dest.exists() {
                    if let Err(e) = copy_directory(target, &dest).await {
                        self.emit_warning_with_context(
                            format!("could not copy {} into the source path", dep.name),
                            e.to_string(),
                        );
                    }
                }
            }
        }

        Ok(())
    }

    async fn set_version(&self, dep: &Dependency, kind: VcsKind, dir: &Path) -> Result<(), Error> {
        if dep.is_resolved() {
            checkout_command(kind, &dep.name, dir, &dep.reference)?
                .run()
                .await?;
        }
        Ok(())
    }

    fn completed(&self, dep: &Dependency, operation: FetchOperation, start: Instant) {
        self.emit(AppEvent::Fetch(FetchEvent::Completed {
            package: dep.name.clone(),
            operation,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        }));
    }
}

#[async_trait]
impl Vcs for CommandVcs {
    async fn fetch(
        &self,
        dep: &Dependency,
        target: &Path,
        cache: &CacheOptions,
    ) -> Result<(), Error> {
        let start = Instant::now();
        self.emit(AppEvent::Fetch(FetchEvent::Started {
            package: dep.name.clone(),
            target: target.display().to_string(),
            operation: FetchOperation::Fetch,
        }));

        let kind = guess_kind(dep);
        self.clone_into(dep, kind, target, cache).await?;
        let kind = detect_kind(target).await.unwrap_or(kind);
        self.set_version(dep, kind, target).await?;

        self.completed(dep, FetchOperation::Fetch, start);
        Ok(())
    }

    async fn update(
        &self,
        dep: &Dependency,
        base_dir: &Path,
        cache: &CacheOptions,
    ) -> Result<(), Error> {
        let target = base_dir.join(&dep.name);
        if fs::metadata(&target).await.is_err() {
            return self.fetch(dep, &target, cache).await;
        }

        let Some(kind) = detect_kind(&target).await else {
            if !self.force {
                return Err(VcsError::NotAWorkingCopy {
                    path: target.display().to_string(),
                    kind: guess_kind(dep).to_string(),
                }
                .into());
            }
            self.emit_debug(format!(
                "replacing {} with a fresh checkout",
                target.display()
            ));
            fs::remove_dir_all(&target)
                .await
                .map_err(|e| InstallError::FilesystemError {
                    operation: "remove_dir_all".to_string(),
                    path: target.display().to_string(),
                    message: e.to_string(),
                })?;
            return self.fetch(dep, &target, cache).await;
        };

        let start = Instant::now();
        self.emit(AppEvent::Fetch(FetchEvent::Started {
            package: dep.name.clone(),
            target: target.display().to_string(),
            operation: FetchOperation::Update,
        }));

        for step in update_commands(kind, &dep.name, &target, !dep.is_resolved())? {
            step.run().await?;
        }
        self.set_version(dep, kind, &target).await?;

        self.completed(dep, FetchOperation::Update, start);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_directory_without_force_is_rejected() {
        let base = tempfile::tempdir().unwrap();
        let target = base.path().join("github.com/foo/bar");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("bar.go"), "package bar\n").unwrap();

        let err = CommandVcs::new()
            .update(
                &Dependency::new("github.com/foo/bar"),
                base.path(),
                &CacheOptions::disabled(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Vcs(VcsError::NotAWorkingCopy { .. })));
        assert!(target.join("bar.go").exists());
    }

    #[tokio::test]
    async fn source_path_copy_skips_the_network() {
        let source = tempfile::tempdir().unwrap();
        let vendor = tempfile::tempdir().unwrap();
        let repo = source.path().join("src/example.com/a");
        std::fs::create_dir_all(repo.join(".git")).unwrap();
        std::fs::write(repo.join("a.go"), "package a\n").unwrap();

        let cache = CacheOptions {
            use_source_path: true,
            source_path: Some(source.path().to_path_buf()),
            ..CacheOptions::disabled()
        };
        let (tx, mut rx) = vendr_events::channel();
        let vcs = CommandVcs::new().with_event_sender(tx);
        let target = vendor.path().join("example.com/a");

        vcs.fetch(&Dependency::new("example.com/a"), &target, &cache)
            .await
            .unwrap();

        assert!(target.join("a.go").exists());
        let mut copied = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, AppEvent::Fetch(FetchEvent::CopiedFromSourcePath { .. })) {
                copied = true;
            }
        }
        assert!(copied);
    }
}
