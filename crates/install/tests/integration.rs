//! Integration tests for install crate

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use vendr_errors::{Error, InstallError, VcsError};
    use vendr_events::{channel, AppEvent, InstallEvent};
    use vendr_install::*;
    use vendr_types::{Dependency, Lockfile, Manifest};
    use vendr_vcs::{CacheOptions, Vcs};

    /// Vcs that materialises canned repositories and records every call
    #[derive(Default)]
    struct FakeVcs {
        repos: HashMap<String, Vec<(String, String)>>,
        broken: HashSet<String>,
        fetches: Mutex<Vec<String>>,
        updates: Mutex<Vec<String>>,
    }

    impl FakeVcs {
        fn repo(mut self, root: &str, files: &[(&str, &str)]) -> Self {
            self.repos.insert(
                root.to_string(),
                files
                    .iter()
                    .map(|(p, c)| ((*p).to_string(), (*c).to_string()))
                    .collect(),
            );
            self
        }

        fn broken(mut self, name: &str) -> Self {
            self.broken.insert(name.to_string());
            self
        }

        fn fetch_count(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }

        fn update_count(&self) -> usize {
            self.updates.lock().unwrap().len()
        }

        fn failure(name: &str) -> Error {
            VcsError::CommandFailed {
                program: "git".into(),
                args: format!("fetch {name}"),
                code: Some(128),
                stderr: "could not read from remote repository".into(),
            }
            .into()
        }
    }

    #[async_trait]
    impl Vcs for FakeVcs {
        async fn fetch(&self, dep: &Dependency, target: &Path, _: &CacheOptions) -> Result<(), Error> {
            self.fetches.lock().unwrap().push(dep.name.clone());
            if self.broken.contains(&dep.name) {
                return Err(Self::failure(&dep.name));
            }
            std::fs::create_dir_all(target)?;
            if let Some(files) = self.repos.get(&dep.name) {
                for (rel, contents) in files {
                    let path = target.join(rel);
                    std::fs::create_dir_all(path.parent().unwrap())?;
                    std::fs::write(path, contents)?;
                }
            }
            Ok(())
        }

        async fn update(&self, dep: &Dependency, base_dir: &Path, cache: &CacheOptions) -> Result<(), Error> {
            let target = base_dir.join(&dep.name);
            if !target.exists() {
                return self.fetch(dep, &target, cache).await;
            }
            self.updates.lock().unwrap().push(dep.name.clone());
            if self.broken.contains(&dep.name) {
                return Err(Self::failure(&dep.name));
            }
            Ok(())
        }
    }

    fn config() -> InstallConfig {
        InstallConfig::default()
            .with_workers(4)
            .with_cache(CacheOptions::disabled())
    }

    fn manifest(imports: Vec<Dependency>) -> Manifest {
        let mut manifest = Manifest::new("example.com/app");
        manifest.imports = imports;
        manifest
    }

    #[tokio::test]
    async fn checkout_skips_existing_directories() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::default());
        let installer = Installer::new(config(), project.path(), vcs.clone());
        let manifest = manifest(vec![
            Dependency::new("github.com/foo/bar"),
            Dependency::new("gopkg.in/yaml.v2"),
        ]);

        assert_eq!(installer.checkout(&manifest, false).await.unwrap(), 2);
        assert!(project.path().join("vendor/gopkg.in/yaml.v2").is_dir());

        assert_eq!(installer.checkout(&manifest, false).await.unwrap(), 0);
        assert_eq!(vcs.fetch_count(), 2);
    }

    #[tokio::test]
    async fn checkout_stops_at_first_failure() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::default().broken("github.com/foo/bad"));
        let installer = Installer::new(config(), project.path(), vcs.clone());
        let manifest = manifest(vec![
            Dependency::new("github.com/foo/bad"),
            Dependency::new("github.com/foo/good"),
        ]);

        let err = installer.checkout(&manifest, false).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Install(InstallError::FetchFailed { ref package, .. }) if package == "github.com/foo/bad"
        ));
        assert_eq!(vcs.fetch_count(), 1);
    }

    #[tokio::test]
    async fn checkout_includes_dev_imports_on_request() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::default());
        let installer = Installer::new(config(), project.path(), vcs.clone());
        let mut manifest = manifest(vec![Dependency::new("github.com/foo/bar")]);
        manifest.dev_imports = vec![Dependency::new("github.com/test/assert")];

        assert_eq!(installer.checkout(&manifest, false).await.unwrap(), 1);
        assert_eq!(installer.checkout(&manifest, true).await.unwrap(), 1);
        assert!(project.path().join("vendor/github.com/test/assert").is_dir());
    }

    #[tokio::test]
    async fn install_with_empty_lock_does_nothing() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::default());
        let (tx, mut rx) = channel();
        let installer =
            Installer::new(config(), project.path(), vcs.clone()).with_event_sender(tx);
        let manifest = manifest(Vec::new());
        let lock = Lockfile::new(&[], manifest.hash().unwrap());

        let outcome = installer.install(&lock, &manifest).await.unwrap();
        assert!(outcome.imports.is_empty());
        assert!(outcome.dev_imports.is_empty());
        assert_eq!(vcs.fetch_count() + vcs.update_count(), 0);

        drop(installer);
        let mut saw_nothing = false;
        while let Some(event) = rx.recv().await {
            if matches!(event, AppEvent::Install(InstallEvent::NothingToInstall)) {
                saw_nothing = true;
            }
        }
        assert!(saw_nothing);
    }

    #[tokio::test]
    async fn install_replays_the_lock_once_per_repository() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::default());
        let installer = Installer::new(config(), project.path(), vcs.clone());
        let deps = [
            Dependency::new("github.com/foo/bar").with_reference("v1.0.0"),
            Dependency::new("github.com/foo/bar").with_subpackages(vec!["baz".into()]),
            Dependency::new("example.com/lib"),
        ];
        let manifest = manifest(Vec::new());
        let lock = Lockfile::new(&deps, manifest.hash().unwrap());

        let outcome = installer.install(&lock, &manifest).await.unwrap();
        assert_eq!(outcome.imports.len(), 2);
        assert!(outcome.imports.is_success());
        assert_eq!(outcome.manifest.imports[0].reference, "v1.0.0");
        assert_eq!(outcome.manifest.imports[0].subpackages, vec!["baz"]);
        assert_eq!(vcs.fetch_count(), 2);
    }

    #[tokio::test]
    async fn pool_survives_failing_updates() {
        let project = tempdir().unwrap();
        let vendor = project.path().join("vendor");
        let mut vcs = FakeVcs::default();
        let mut deps = Vec::new();
        for i in 0..6 {
            let name = format!("github.com/org/repo{i}");
            std::fs::create_dir_all(vendor.join(&name)).unwrap();
            if i != 3 {
                vcs = vcs.broken(&name);
            }
            deps.push(Dependency::new(name));
        }
        let vcs = Arc::new(vcs);
        let pool = FetchPool::new(2, vcs.clone());

        let report = pool.run(&deps, &vendor).await;

        assert_eq!(report.len(), 6);
        assert_eq!(report.updated_count(), 1);
        assert_eq!(report.failures().count(), 5);
        assert!(report.outcome("github.com/org/repo3").unwrap().is_updated());
        assert_eq!(vcs.update_count(), 6);
        assert_eq!(pool.live_workers(), 0);
    }

    fn remote() -> FakeVcs {
        FakeVcs::default()
            .repo(
                "github.com/foo/bar",
                &[
                    ("bar.go", "package bar\n\nimport \"example.com/lib\"\n"),
                    ("baz/baz.go", "package baz\n\nimport (\n\t\"fmt\"\n\t\"github.com/foo/bar\"\n)\n"),
                ],
            )
            .repo("example.com/lib", &[("lib.go", "package lib\n\nimport \"strings\"\n")])
    }

    #[tokio::test]
    async fn update_resolves_fetches_and_locks() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(remote());
        let (tx, mut rx) = channel();
        let installer =
            Installer::new(config(), project.path(), vcs.clone()).with_event_sender(tx);
        let manifest = manifest(vec![Dependency::new("github.com/foo/bar")
            .with_reference("v1.2.0")
            .with_subpackages(vec!["baz".into()])]);

        let result = installer.update_with_report(&manifest).await.unwrap();
        let lock = result.lockfile;

        assert!(lock.matches(&manifest.hash().unwrap()));
        let names: Vec<&str> = lock.imports.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["github.com/foo/bar", "example.com/lib"]);
        assert_eq!(lock.imports[0].version, "v1.2.0");
        assert_eq!(lock.imports[0].subpackages, vec!["baz"]);

        // each repository is cloned once during resolution, then refreshed
        assert_eq!(vcs.fetch_count(), 2);
        assert_eq!(vcs.update_count(), 2);
        assert!(result.imports.is_success());
        assert!(result.pruned.is_empty());

        drop(installer);
        let mut phases = Vec::new();
        while let Some(event) = rx.recv().await {
            if let AppEvent::Install(InstallEvent::PhaseChanged { phase }) = event {
                phases.push(phase);
            }
        }
        assert_eq!(phases.len(), 4);
    }

    #[tokio::test]
    async fn update_prunes_unused_when_asked() {
        let project = tempdir().unwrap();
        let stale = project.path().join("vendor/github.com/old/thing");
        std::fs::create_dir_all(&stale).unwrap();
        let vcs = Arc::new(remote());
        let installer = Installer::new(
            config().with_delete_unused(true),
            project.path(),
            vcs.clone(),
        );
        let manifest = manifest(vec![Dependency::new("github.com/foo/bar")]);

        let result = installer.update_with_report(&manifest).await.unwrap();

        assert_eq!(result.pruned, vec![project.path().join("vendor/github.com/old")]);
        assert!(!stale.exists());
        assert!(project.path().join("vendor/example.com/lib").is_dir());
    }

    #[tokio::test]
    async fn update_vendors_dev_imports_without_resolving_them() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(remote());
        let installer = Installer::new(config(), project.path(), vcs.clone());
        let mut manifest = manifest(vec![Dependency::new("example.com/lib")]);
        manifest.dev_imports = vec![Dependency::new("github.com/test/assert")];

        let lock = installer.update(&manifest).await.unwrap();

        assert_eq!(lock.imports.len(), 1);
        assert_eq!(lock.dev_imports.len(), 1);
        assert!(project.path().join("vendor/github.com/test/assert").is_dir());
    }

    #[tokio::test]
    async fn update_fails_when_a_missing_package_cannot_be_fetched() {
        let project = tempdir().unwrap();
        let vcs = Arc::new(FakeVcs::default().broken("github.com/gone/away"));
        let installer = Installer::new(config(), project.path(), vcs.clone());
        let manifest = manifest(vec![Dependency::new("github.com/gone/away")]);

        let err = installer.update(&manifest).await.unwrap_err();
        assert!(matches!(err, Error::Resolve(_)));
        assert_eq!(vcs.update_count(), 0);
    }

    #[tokio::test]
    async fn zero_workers_is_rejected() {
        let project = tempdir().unwrap();
        let installer = Installer::new(
            config().with_workers(0),
            project.path(),
            Arc::new(FakeVcs::default()),
        );
        let err = installer.update(&manifest(Vec::new())).await.unwrap_err();
        assert!(matches!(err, Error::Install(InstallError::InvalidConfig { .. })));
    }
}
